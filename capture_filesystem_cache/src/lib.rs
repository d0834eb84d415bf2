//! A disk-backed [`vid_match_lib::CaptureStore`].
//!
//! Reading the metadata of a video and seeking to a dozen offsets in it is slow. This
//! crate keeps the metadata and the (shrunk, JPEG-encoded) frame captures of every video
//! in a single bincode file, keyed by [`vid_match_lib::CacheId`]. Because the key covers the
//! path and modification time, moved or edited files simply miss the cache.
//!
//! ```rust,no_run
//! use capture_filesystem_cache::CaptureFilesystemCache;
//!
//! // Save to disk after every 100 modifications.
//! let cache = CaptureFilesystemCache::new(100, "captures.bin".into()).expect("failed to load cache");
//!
//! // Hand the cache to a VideoProcessor (by reference, so it can be saved afterwards)
//! // and process videos as normal...
//!
//! // The cache does not save itself when dropped.
//! cache.save().unwrap();
//! ```

#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

mod base_fs_cache;
#[allow(clippy::module_inception)]
mod capture_filesystem_cache;
mod errors;

pub use capture_filesystem_cache::{CaptureEntry, CaptureFilesystemCache};
pub use errors::{CaptureCacheError, CaptureCacheResult};
