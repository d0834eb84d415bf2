use std::path::PathBuf;

use capture_filesystem_cache::CaptureCacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    CacheError(#[from] CaptureCacheError),

    #[error("Matching error: {0}")]
    MatchError(#[from] vid_match_lib::Error),

    #[error("Failed to read config file {path}: {src}")]
    ConfigRead { src: std::io::Error, path: PathBuf },

    #[error("Failed to parse config file {path}: {src}")]
    ConfigParse { src: serde_json::Error, path: PathBuf },

    #[error("ffmpeg and ffprobe must be installed and on the PATH")]
    FfmpegNotFound,
}

pub fn print_error_and_quit(e: eyre::Report) -> ! {
    #[allow(clippy::print_stderr)]
    let () = eprintln!("{:?}", e);
    std::process::exit(1);
}
