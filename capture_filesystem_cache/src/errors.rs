use std::path::{Path, PathBuf};

use thiserror::Error;

pub type CaptureCacheResult<T> = Result<T, CaptureCacheError>;

/// Failures of the capture cache. Each carries the path of the cache file.
#[derive(Error, Debug)]
pub enum CaptureCacheError {
    #[error("Could not read or write capture cache {path}: {src}")]
    Io { src: std::io::Error, path: PathBuf },

    /// The captures could not be encoded. Nothing was written.
    #[error("Could not encode captures for cache {path}: {reason}")]
    Encode { reason: String, path: PathBuf },

    /// The file is truncated, or was written by a build with a different entry layout.
    #[error("Capture cache {path} is corrupt or from an incompatible version: {reason}")]
    Decode { reason: String, path: PathBuf },
}

impl CaptureCacheError {
    /// The cache file this error concerns.
    #[must_use]
    pub fn cache_path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Encode { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}
