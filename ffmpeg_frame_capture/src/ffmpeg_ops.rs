use std::{
    ffi::{OsStr, OsString},
    io::prelude::*,
    path::Path,
    process::{Child, Command, Stdio},
    thread::JoinHandle,
    time::Duration,
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use image::{ImageFormat, RgbImage};
use wait_timeout::ChildExt;
use FfmpegCommandName::*;
use FfmpegError::*;

use crate::*;

const FFPROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Decode the single frame displayed at `timestamp` and return it as RGB. The frame is
/// autorotated by ffmpeg, so its dimensions are the display dimensions of the video.
///
/// # errors
/// * ffmpeg is not installed, fails, or does not finish within `timeout`
/// * no frame exists at `timestamp` (e.g. seeking past the end of a truncated file)
pub fn capture_frame_at<P: AsRef<Path>>(
    src_path: P,
    timestamp: Duration,
    timeout: Duration,
) -> Result<RgbImage, FfmpegError> {
    // -ss before -i makes ffmpeg seek on keyframes and then decode forward, which is
    // accurate and much faster than decoding from the start.
    let seek_string = OsString::from(format!("{:.3}", timestamp.as_secs_f64()));

    #[rustfmt::skip]
    let args = &[
        OsStr::new("-hide_banner"),
        OsStr::new("-loglevel"), OsStr::new("error"),
        OsStr::new("-nostats"),
        OsStr::new("-ss"),       seek_string.as_os_str(),
        OsStr::new("-i"),        OsStr::new(src_path.as_ref()),
        OsStr::new("-an"),
        OsStr::new("-frames:v"), OsStr::new("1"),
        OsStr::new("-c:v"),      OsStr::new("bmp"),
        OsStr::new("-f"),        OsStr::new("image2pipe"),
        OsStr::new("-"),
    ];

    let stdout = run_ffmpeg_command(Ffmpeg, args, timeout)?.stdout;

    if stdout.is_empty() {
        log::trace!(
            target: "ffmpeg_capture",
            "no frame at {:?} in {}",
            timestamp,
            src_path.as_ref().display()
        );
        return Err(NoFrame);
    }

    image::load_from_memory_with_format(&stdout, ImageFormat::Bmp)
        .map(|img| img.to_rgb8())
        .map_err(|e| FrameDecode(e.to_string()))
}

pub fn get_video_stats<P: AsRef<Path>>(src_path: P) -> Result<String, FfmpegError> {
    let args = &[
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new(src_path.as_ref()),
    ];

    let stdout = run_ffmpeg_command(Ffprobe, args, FFPROBE_TIMEOUT)?.stdout;

    String::from_utf8(stdout).map_err(|_| Utf8Conversion)
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    //check ffprobe is callable.
    if run_ffmpeg_command(Ffprobe, &[OsStr::new("-version")], FFPROBE_TIMEOUT).is_err() {
        return false;
    }

    //now ffmpeg.
    if run_ffmpeg_command(Ffmpeg, &[OsStr::new("-version")], FFPROBE_TIMEOUT).is_err() {
        return false;
    }

    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FfmpegCommandName {
    Ffprobe,
    Ffmpeg,
}

impl FfmpegCommandName {
    pub fn as_os_str(&self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_ffmpeg_command(name: FfmpegCommandName, args: &[&OsStr]) -> Result<Child, FfmpegError> {
    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        //shell failed to execute the command. Separate out FileNotFound from all other errors
        //as by far the most likely cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

struct FfmpegOutput {
    stdout: Vec<u8>,
}

// Drain a pipe on its own thread so a full stderr can never block ffmpeg while we wait
// on stdout (or vice versa).
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut acc = vec![];
        if let Some(mut pipe) = pipe {
            let _read_error = pipe.read_to_end(&mut acc);
        }
        acc
    })
}

fn run_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    timeout: Duration,
) -> Result<FfmpegOutput, FfmpegError> {
    fn truncate_ffmpeg_err_msg(stderr: &[u8]) -> FfmpegError {
        match std::str::from_utf8(stderr) {
            Ok(error_text) => FfmpegInternal(error_text.chars().take(500).collect::<String>()),
            Err(_) => Utf8Conversion,
        }
    }

    let mut child = spawn_ffmpeg_command(name, args)?;

    let stdout_thread = drain(child.stdout.take());
    let stderr_thread = drain(child.stderr.take());

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            // to prevent accumulation of zombie processes, reap the child here.
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Timeout);
        }
        Err(e) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Io(format!("{:?}", e.kind())));
        }
    };

    //the pipes are closed once the child exits, so these joins cannot hang.
    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    if status.success() {
        Ok(FfmpegOutput { stdout })
    } else {
        //sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
        Err(truncate_ffmpeg_err_msg(&stderr))
    }
}
