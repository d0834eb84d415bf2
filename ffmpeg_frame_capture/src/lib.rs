//! Thin wrapper around the ffmpeg and ffprobe command line tools.
//!
//! * [`VideoInfo::new`] reads the container metadata of a file.
//! * [`capture_frame_at`] decodes the single frame shown at a timestamp.
//!
//! Both tools must be installed and visible on the command line.

#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod ffmpeg_stats;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::{capture_frame_at, ffmpeg_and_ffprobe_are_callable, get_video_stats};
pub use ffmpeg_stats::{FfmpegVideoRotation, VideoInfo, VideoInfoError};
