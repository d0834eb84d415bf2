use std::{
    collections::HashMap,
    fmt::Debug,
    hash::Hash,
    io::{BufReader, BufWriter},
    path::PathBuf,
    sync::atomic::{AtomicU32, Ordering::Relaxed},
};

use log::{info, trace};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};

use super::errors::{CaptureCacheError, CaptureCacheResult};

//On-disk format of the cache.
type CacheDiskFormat<K, T> = HashMap<K, T>;

/// A map that lives in a single bincode file, saved after every `cache_save_threshold`
/// modifications and on request.
#[derive(Debug)]
pub struct BaseFsCache<K, T> {
    cache_save_threshold: u32,
    cache_modified_count: AtomicU32,
    cache_path: PathBuf,
    cache: RwLock<CacheDiskFormat<K, T>>,
}

impl<K, T> BaseFsCache<K, T>
where
    K: Eq + Hash + Debug + Clone + DeserializeOwned + Serialize + Send + Sync,
    T: DeserializeOwned + Serialize + Send + Sync + Clone + Default,
{
    /// Load the cache at `cache_path`, or start an empty one if there is no file there.
    pub fn new(cache_save_threshold: u32, cache_path: PathBuf) -> CaptureCacheResult<Self> {
        let mut ret = Self {
            cache_save_threshold: cache_save_threshold.max(1),
            cache_modified_count: AtomicU32::default(),
            cache_path,
            cache: RwLock::default(),
        };

        ret.load_cache_from_disk()?;
        Ok(ret)
    }

    /// Write the cache to disk if it has been modified since the last save.
    pub fn save(&self) -> CaptureCacheResult<()> {
        if self.cache_modified_count.load(Relaxed) > 0 {
            self.cache_modified_count.store(0, Relaxed);
            self.save_inner()
        } else {
            Ok(())
        }
    }

    fn io_err(&self, src: std::io::Error) -> CaptureCacheError {
        CaptureCacheError::Io {
            src,
            path: self.cache_path.clone(),
        }
    }

    fn save_inner(&self) -> CaptureCacheResult<()> {
        //The cache file and its directory may not exist yet.
        if !self.cache_path.exists() {
            if let Some(parent_dir) = self.cache_path.parent() {
                std::fs::create_dir_all(parent_dir).map_err(|e| self.io_err(e))?;
            }
        }

        //If the application dies or gets killed while saving, we risk losing the cache.
        //So we will first save the cache to a temporary file and rename it into the real
        //cache file.
        let temp_store_path = self.cache_path.with_extension("tmp");

        info!(
            target: "capture_cache",
            "saving updated cache at {} of size {}",
            self.cache_path.display(),
            self.cache.read().len()
        );

        let temp_cache_file = std::fs::File::create(&temp_store_path).map_err(|e| self.io_err(e))?;
        let mut cache_buf = BufWriter::new(temp_cache_file);

        bincode::serialize_into(&mut cache_buf, &*self.cache.read()).map_err(|e| CaptureCacheError::Encode {
            reason: format!("{e}"),
            path: self.cache_path.clone(),
        })?;

        let temp_cache_file = cache_buf
            .into_inner()
            .map_err(|e| self.io_err(e.into_error()))?;
        temp_cache_file.sync_all().map_err(|e| self.io_err(e))?;

        //now move the store to replace the old one.
        std::fs::rename(temp_store_path, &self.cache_path).map_err(|e| self.io_err(e))?;

        Ok(())
    }

    fn load_cache_from_disk(&mut self) -> CaptureCacheResult<()> {
        //No file is not an error. It just means that nothing has been cached yet.
        if !self.cache_path.exists() {
            info!(
                target: "capture_cache",
                "Creating new cache file: {}.", self.cache_path.display()
            );
            self.cache = RwLock::default();
            return Ok(());
        }

        let cache_file = std::fs::File::open(&self.cache_path).map_err(|e| self.io_err(e))?;

        //Fails if the entry format has changed since the file was written.
        let cache_file_data: CacheDiskFormat<K, T> =
            bincode::deserialize_from(BufReader::new(cache_file)).map_err(|e| CaptureCacheError::Decode {
                reason: format!("{e}"),
                path: self.cache_path.clone(),
            })?;

        self.cache = RwLock::new(cache_file_data);

        trace!(
            target: "capture_cache",
            "Loaded cache. Path: {}, Entries: {}", self.cache_path.display(), self.len()
        );
        Ok(())
    }

    /////////////////////////////
    // Wrappers for HashMap.
    /////////////////////////////

    /// Modify the entry for `key` in place, starting from `T::default()` if there is none.
    pub fn upsert(&self, key: &K, f: impl FnOnce(&mut T)) -> CaptureCacheResult<()> {
        trace!(target: "capture_cache", "updating: {key:?}");
        {
            let mut writeable_cache = self.cache.write();
            f(writeable_cache.entry(key.clone()).or_default());
        }
        let cache_modified_count = self.cache_modified_count.fetch_add(1, Relaxed);
        self.update_transaction_count_and_save_if_necessary(cache_modified_count)
    }

    pub fn remove(&self, key: &K) -> CaptureCacheResult<()> {
        trace!(target: "capture_cache", "removing: {key:?}");
        self.cache.write().remove(key);
        let cache_modified_count = self.cache_modified_count.fetch_add(1, Relaxed);
        self.update_transaction_count_and_save_if_necessary(cache_modified_count)
    }

    fn update_transaction_count_and_save_if_necessary(&self, prev_count: u32) -> CaptureCacheResult<()> {
        //Relaxed is enough: at worst a save happens more often than necessary.
        if prev_count + 1 >= self.cache_save_threshold {
            self.cache_modified_count.store(0, Relaxed);
            self.save_inner()
        } else {
            Ok(())
        }
    }

    /// Read part of the entry for `key` without cloning all of it.
    pub fn fetch_with<R>(&self, key: &K, f: impl FnOnce(&T) -> Option<R>) -> Option<R> {
        self.cache.read().get(key).and_then(f)
    }

    pub fn keys(&self) -> Vec<K> {
        self.cache.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}
