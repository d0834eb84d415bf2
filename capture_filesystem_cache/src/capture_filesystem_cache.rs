use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use vid_match_lib::{CacheId, CaptureStore, VideoMetadata};

use crate::{base_fs_cache::BaseFsCache, CaptureCacheError, CaptureCacheResult};

/// Everything cached about one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureEntry {
    pub metadata: Option<VideoMetadata>,

    /// JPEG captures by percentage of the video's duration.
    pub captures: BTreeMap<u32, Vec<u8>>,
}

/// A disk-backed cache of video metadata and frame captures.
///
/// All methods take `&self` and can be called from many threads at once.
///
/// Note: The cache does not save its contents when it goes out of scope. Call
/// [`save`][`CaptureFilesystemCache::save`] after the last modification.
#[derive(Debug)]
pub struct CaptureFilesystemCache(BaseFsCache<CacheId, CaptureEntry>);

impl CaptureFilesystemCache {
    /// Load a cache from `cache_path`. If no cache exists there a new one is created.
    ///
    /// The cache saves itself to disk every `cache_save_threshold` modifications.
    ///
    /// # Errors
    /// Returns an error if a cache file exists but could not be read.
    pub fn new(cache_save_threshold: u32, cache_path: PathBuf) -> CaptureCacheResult<Self> {
        Ok(Self(BaseFsCache::new(cache_save_threshold, cache_path)?))
    }

    /// # Errors
    /// Returns an error if the cache file could not be written.
    pub fn save(&self) -> CaptureCacheResult<()> {
        self.0.save()
    }

    /// Forget everything about a video.
    ///
    /// # Errors
    /// Returns an error if this modification triggered a save, and the save failed.
    pub fn remove(&self, id: &CacheId) -> CaptureCacheResult<()> {
        self.0.remove(id)
    }

    /// Drop every entry not in `live`, e.g. the ids of the files that exist right now.
    ///
    /// # Errors
    /// Returns an error if a triggered save failed.
    pub fn retain(&self, live: &[CacheId]) -> CaptureCacheResult<()> {
        for id in self.0.keys() {
            if !live.contains(&id) {
                self.0.remove(&id)?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl CaptureStore for CaptureFilesystemCache {
    type Error = CaptureCacheError;

    fn read_metadata(&self, id: &CacheId) -> Option<VideoMetadata> {
        self.0.fetch_with(id, |entry| entry.metadata.clone())
    }

    fn write_metadata(&self, id: &CacheId, metadata: &VideoMetadata) -> CaptureCacheResult<()> {
        self.0
            .upsert(id, |entry| entry.metadata = Some(metadata.clone()))
    }

    fn read_capture(&self, id: &CacheId, percent: u32) -> Option<Vec<u8>> {
        self.0
            .fetch_with(id, |entry| entry.captures.get(&percent).cloned())
    }

    fn write_capture(&self, id: &CacheId, percent: u32, jpeg: Vec<u8>) -> CaptureCacheResult<()> {
        self.0.upsert(id, |entry| {
            entry.captures.insert(percent, jpeg);
        })
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, UNIX_EPOCH};

    use tempfile::TempDir;

    use super::*;

    fn id(name: &str) -> CacheId {
        CacheId::new(name, UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            duration_ms: 600_000,
            width: 1280,
            height: 720,
            framerate: 29.97,
            codec: "h264".to_string(),
            ..VideoMetadata::default()
        }
    }

    #[test]
    fn test_missing_entries_are_none() {
        let dir = TempDir::new().unwrap();
        let cache = CaptureFilesystemCache::new(100, dir.path().join("c.bin")).unwrap();

        assert!(cache.is_empty());
        assert_eq!(cache.read_metadata(&id("a")), None);
        assert_eq!(cache.read_capture(&id("a"), 48), None);
    }

    #[test]
    fn test_entries_survive_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("c.bin");

        let cache = CaptureFilesystemCache::new(100, path.clone()).unwrap();
        cache.write_metadata(&id("a"), &metadata()).unwrap();
        cache.write_capture(&id("a"), 48, vec![1, 2, 3]).unwrap();
        cache.write_capture(&id("b"), 96, vec![4]).unwrap();
        cache.save().unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let reloaded = CaptureFilesystemCache::new(100, path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.read_metadata(&id("a")), Some(metadata()));
        assert_eq!(reloaded.read_capture(&id("a"), 48), Some(vec![1, 2, 3]));
        assert_eq!(reloaded.read_capture(&id("a"), 96), None);
        assert_eq!(reloaded.read_metadata(&id("b")), None);
        assert_eq!(reloaded.read_capture(&id("b"), 96), Some(vec![4]));
    }

    #[test]
    fn test_saves_itself_at_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.bin");

        let cache = CaptureFilesystemCache::new(2, path.clone()).unwrap();
        cache.write_capture(&id("a"), 8, vec![0]).unwrap();
        assert!(!path.exists());
        cache.write_capture(&id("a"), 16, vec![0]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_retain_drops_dead_entries() {
        let dir = TempDir::new().unwrap();
        let cache = CaptureFilesystemCache::new(100, dir.path().join("c.bin")).unwrap();
        for name in ["a", "b", "c"] {
            cache.write_metadata(&id(name), &metadata()).unwrap();
        }

        cache.retain(&[id("b")]).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.read_metadata(&id("b")).is_some());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.bin");
        //too short to hold even the entry count.
        std::fs::write(&path, b"abc").unwrap();

        let err = CaptureFilesystemCache::new(100, path.clone()).unwrap_err();
        assert!(matches!(err, CaptureCacheError::Decode { .. }));
        assert_eq!(err.cache_path(), path);
        assert!(err.to_string().contains("corrupt or from an incompatible version"));
    }

    #[test]
    fn test_unwritable_cache_path_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        //a regular file where the cache directory should be.
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();
        let path = blocker.join("c.bin");

        let cache = CaptureFilesystemCache::new(100, path.clone()).unwrap();
        cache.write_metadata(&id("a"), &metadata()).unwrap();

        let err = cache.save().unwrap_err();
        assert!(matches!(err, CaptureCacheError::Io { .. }));
        assert_eq!(err.cache_path(), path);
    }
}
