use std::{
    fmt,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Rotation declared in a video's container metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}

impl Rotation {
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Rot90 | Self::Rot270)
    }
}

/// Container metadata, as reported by a [`crate::FrameDecoder`]. `width` and `height` are
/// the coded resolution, before `rotation` is applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration_ms: u64,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub framerate: f64,
    pub bitrate_kbps: u32,
    pub codec: String,
    pub audio: String,
}

impl VideoMetadata {
    /// The resolution that frames are displayed (and captured) at.
    #[must_use]
    pub const fn display_resolution(&self) -> (u32, u32) {
        if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Zero width, height or duration means the file is not usable as a video.
    #[must_use]
    pub const fn is_video(&self) -> bool {
        self.width > 0 && self.height > 0 && self.duration_ms > 0
    }
}

/// Everything known about one video file, apart from its fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    path: PathBuf,
    size_bytes: u64,
    modified: SystemTime,
    duration_ms: u64,
    width: u32,
    height: u32,
    framerate: f64,
    bitrate_kbps: u32,
    codec: String,
    audio: String,
}

impl VideoRecord {
    /// Rotated videos are recorded at their display resolution.
    #[must_use]
    pub fn new(
        path: impl AsRef<Path>,
        size_bytes: u64,
        modified: SystemTime,
        metadata: &VideoMetadata,
    ) -> Self {
        let (width, height) = metadata.display_resolution();
        Self {
            path: path.as_ref().to_path_buf(),
            size_bytes,
            modified,
            duration_ms: metadata.duration_ms,
            width,
            height,
            framerate: metadata.framerate,
            bitrate_kbps: metadata.bitrate_kbps,
            codec: metadata.codec.clone(),
            audio: metadata.audio.clone(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    #[must_use]
    pub const fn modified(&self) -> SystemTime {
        self.modified
    }

    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[must_use]
    pub const fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub const fn framerate(&self) -> f64 {
        self.framerate
    }

    #[must_use]
    pub const fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    #[must_use]
    pub fn codec(&self) -> &str {
        &self.codec
    }

    #[must_use]
    pub fn audio(&self) -> &str {
        &self.audio
    }

    /// The file name, lossily converted. Empty if the path has none.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Stable key for persisted per-video data: changes whenever the file is moved or modified.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheId(String);

impl CacheId {
    /// Lowercase hex BLAKE3 digest of `"<path>_<mtime secs>.<mtime millis>"`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, modified: SystemTime) -> Self {
        //mtimes before the epoch are clamped to it.
        let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
        let key = format!(
            "{}_{}.{:03}",
            path.as_ref().display(),
            since_epoch.as_secs(),
            since_epoch.subsec_millis()
        );

        Self(blake3::hash(key.as_bytes()).to_hex().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_rotated_record_swaps_resolution() {
        let metadata = VideoMetadata {
            duration_ms: 1000,
            width: 1920,
            height: 1080,
            rotation: Rotation::Rot90,
            ..VideoMetadata::default()
        };
        let record = VideoRecord::new("/a/b.mp4", 5, UNIX_EPOCH, &metadata);
        assert_eq!(record.resolution(), (1080, 1920));
        assert_eq!(record.file_name(), "b.mp4");
    }

    #[test]
    fn test_cache_id_depends_on_path_and_mtime() {
        let t0 = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        let t1 = t0 + Duration::from_millis(1);

        let id = CacheId::new("/v/a.mkv", t0);
        assert_eq!(id, CacheId::new("/v/a.mkv", t0));
        assert_ne!(id, CacheId::new("/v/a.mkv", t1));
        assert_ne!(id, CacheId::new("/v/b.mkv", t0));

        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
