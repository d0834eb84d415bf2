#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]
//#![warn(clippy::expect_used)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `vid_match_lib` is a library for finding pairs of near-duplicate video files.
//! A near-duplicate is a file that closely resembles another but may differ in format,
//! resolution, quality, bitrate or length.
//!
//! The library will not match videos that have been rotated/flipped, sped up or slowed
//! down, or embedded in the corner of another video.
//!
//! # High Level API
//! First turn each video file into a [`HashedVideo`] with a [`VideoProcessor`]. Then
//! either build a [`MatchSet`] of every matching pair, or walk the collection lazily with
//! a [`LiveScan`]. Both are driven by a [`MatchConfig`].
//!
//! ```rust,no_run
//! use vid_match_lib::{
//!     FfmpegDecoder, MatchConfig, MatchSet, NoStore, ScanStep, ThumbnailLayout, VideoProcessor,
//! };
//!
//! let processor = VideoProcessor::new(FfmpegDecoder::default(), NoStore, ThumbnailLayout::default());
//! let videos: Vec<_> = ["a.mp4", "b.mkv", "c.webm"]
//!     .iter()
//!     .filter_map(|path| processor.process(path).ok())
//!     .collect();
//!
//! let config = MatchConfig::default();
//! let mut matches = MatchSet::build(&videos, &config);
//! while let Ok(ScanStep::Found(pair)) = matches.next(&videos, &config) {
//!     println!("{} ~ {} ({})", pair.left_path().display(), pair.right_path().display(), pair.similarity());
//! }
//! ```
//!
//! # Prerequisites
//! The default decoder calls Ffmpeg from the command line. You must make Ffmpeg and
//! Ffprobe available on the command line, for example:
//!
//! * Debian-based systems: ```# apt-get install ffmpeg```
//! * Yum-based systems: ```# yum install ffmpeg```
//! * Windows:
//!     1) Download the correct installer from <https://ffmpeg.org/download.html>
//!     2) Run the installer and install ffmpeg to any directory
//!     3) Add the directory into the PATH environment variable
//!
//! Any other source of frames can be used by implementing [`FrameDecoder`].
//!
//! # How it works
//! Frames are sampled at fixed percentages of each video's duration (e.g 8%, 16% .. 96%)
//! and tiled into a composite thumbnail. The composite is shrunk to 32x32 grayscale and
//! the sign of each of the 64 lowest-frequency [discrete cosine transform](http://hackerfactor.com/blog/index.php%3F/archives/432-Looks-Like-It.html)
//! coefficients against their mean becomes one bit of a perceptual hash. A 16x16
//! grayscale copy is kept alongside for structural similarity (SSIM) comparisons.
//!
//! With [`ThumbnailLayout::Segmented`] each of the 16 cells of the composite is hashed on
//! its own, so that videos which only share some of their content can still match.
//!
//! Two videos are compared by counting matching hash bits, nudged up when their durations
//! agree and down when they do not. In hybrid mode, pairs that are close enough on bits
//! are then decided by SSIM.
//!
//! # Caching
//! Probing videos and decoding frames is by far the slowest part of fingerprinting.
//! A [`CaptureStore`] keeps metadata and captured frames between runs. There is a
//! companion crate, `capture_filesystem_cache`, which stores them on disk.

mod capture_store;
mod decoder;
mod definitions;
mod error;
mod fingerprinting;
mod hashed_video;
mod matching;
mod similarity;
mod video_processor;
mod video_record;

pub use capture_store::{CaptureStore, NoStore};
#[cfg(feature = "ffmpeg_backend")]
pub use decoder::FfmpegDecoder;
pub use decoder::FrameDecoder;
pub use error::Error;
pub use fingerprinting::{
    fingerprint::{Fingerprint, HashSlots},
    fingerprint_builder::FingerprintBuilder,
    frame_compositor::{sample_timestamp, Composite, FrameCompositor},
};
pub use hashed_video::HashedVideo;
pub use matching::{
    live_scan::LiveScan,
    match_candidate::{MatchCandidate, ScanStep},
    match_config::{
        MatchConfig, MatchMode, ThresholdBand, ThresholdConfig, SLOW_BAND_SEPARATION,
        SLOW_BOUND_LIMIT,
    },
    match_policy::{MatchPolicy, MatchVerdict, Similarity},
    match_set::MatchSet,
    summary::{summarize_matches, MatchSummary},
};
pub use similarity::{
    hash_similarity::{hash_similarity, DurationBias},
    ssim::ssim,
};
pub use video_processor::VideoProcessor;
pub use video_record::{CacheId, Rotation, VideoMetadata, VideoRecord};

pub use definitions::{
    ThumbnailLayout, DEFAULT_BAD_NAME_PATTERN, DEFAULT_DIFFERENT_DURATION_PENALTY,
    DEFAULT_FAST_LOWER, DEFAULT_FAST_UPPER, DEFAULT_MIN_DURATION_MS, DEFAULT_MIN_SIZE_BYTES,
    DEFAULT_SAME_DURATION_BONUS, DEFAULT_SLOW_LOWER, DEFAULT_SLOW_UPPER, DEFAULT_SSIM_BLOCK_SIZE,
    HASH_BITS,
};

#[doc(hidden)]
pub mod test_util;
