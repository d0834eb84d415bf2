use std::convert::Infallible;

use crate::{CacheId, VideoMetadata};

/// Persistent per-video storage of metadata and of the JPEG captures taken at each
/// duration percentage. A missing entry is normal and is reported as `None`.
pub trait CaptureStore: Send + Sync {
    type Error: std::error::Error;

    fn read_metadata(&self, id: &CacheId) -> Option<VideoMetadata>;

    fn write_metadata(&self, id: &CacheId, metadata: &VideoMetadata) -> Result<(), Self::Error>;

    fn read_capture(&self, id: &CacheId, percent: u32) -> Option<Vec<u8>>;

    fn write_capture(&self, id: &CacheId, percent: u32, jpeg: Vec<u8>) -> Result<(), Self::Error>;
}

impl<T: CaptureStore + ?Sized> CaptureStore for &T {
    type Error = T::Error;

    fn read_metadata(&self, id: &CacheId) -> Option<VideoMetadata> {
        (**self).read_metadata(id)
    }

    fn write_metadata(&self, id: &CacheId, metadata: &VideoMetadata) -> Result<(), Self::Error> {
        (**self).write_metadata(id, metadata)
    }

    fn read_capture(&self, id: &CacheId, percent: u32) -> Option<Vec<u8>> {
        (**self).read_capture(id, percent)
    }

    fn write_capture(&self, id: &CacheId, percent: u32, jpeg: Vec<u8>) -> Result<(), Self::Error> {
        (**self).write_capture(id, percent, jpeg)
    }
}

/// A store that remembers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

impl CaptureStore for NoStore {
    type Error = Infallible;

    fn read_metadata(&self, _id: &CacheId) -> Option<VideoMetadata> {
        None
    }

    fn write_metadata(&self, _id: &CacheId, _metadata: &VideoMetadata) -> Result<(), Infallible> {
        Ok(())
    }

    fn read_capture(&self, _id: &CacheId, _percent: u32) -> Option<Vec<u8>> {
        None
    }

    fn write_capture(&self, _id: &CacheId, _percent: u32, _jpeg: Vec<u8>) -> Result<(), Infallible> {
        Ok(())
    }
}
