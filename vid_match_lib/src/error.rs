use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a video was rejected from fingerprinting, or an operation on matches failed.
///
/// Rejections are terminal for that video only; they never abort processing of the rest
/// of a collection.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// The file does not exist (or could not be stat-ed).
    #[error("File not found: {0}")]
    FileMissing(PathBuf),

    /// The decoder reported zero width, height or duration.
    #[error("File is not a video")]
    NotVideo,

    /// No complete set of frames could be captured, even after retrying from earlier offsets.
    #[error("Could not capture frames from video")]
    UnreadableSource,

    /// A captured frame was larger than the resolution claimed by the video's metadata.
    #[error("Captured frame {frame_dims:?} is larger than video resolution {video_dims:?}")]
    MalformedMetadata {
        frame_dims: (u32, u32),
        video_dims: (u32, u32),
    },

    /// Every hash slot came out zero (blank or near-monochrome frames).
    #[error("Video frames are (nearly) monochrome")]
    DegenerateContent,

    #[error("Decoder error: {0}")]
    Decoder(String),

    /// The match set was built under a different configuration or collection.
    #[error("Match set is stale; rebuild it before navigating")]
    StaleMatchSet,

    /// Hashes and similarity matrices disagree in number or shape.
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}
