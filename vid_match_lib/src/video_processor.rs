use std::{collections::BTreeMap, fs, path::Path};

use image::RgbImage;
use log::{debug, trace, warn};
use vid_match_common::{decode_jpeg, encode_jpeg};

use crate::{
    definitions::THUMB_JPEG_QUALITY, CacheId, CaptureStore, Error, FingerprintBuilder,
    FrameCompositor, FrameDecoder, HashedVideo, ThumbnailLayout, VideoMetadata, VideoRecord,
};

/// Turns video files into [`HashedVideo`]s, reusing whatever a [`CaptureStore`] already
/// knows about each file.
pub struct VideoProcessor<D, S> {
    compositor: FrameCompositor<D>,
    decoder: D,
    store: S,
    layout: ThumbnailLayout,
}

impl<D: FrameDecoder + Clone, S: CaptureStore> VideoProcessor<D, S> {
    pub fn new(decoder: D, store: S, layout: ThumbnailLayout) -> Self {
        Self {
            compositor: FrameCompositor::new(decoder.clone(), layout),
            decoder,
            store,
            layout,
        }
    }

    #[must_use]
    pub const fn layout(&self) -> ThumbnailLayout {
        self.layout
    }

    /// Fingerprint one video.
    ///
    /// Metadata and captures are read from the store when present. Anything newly
    /// read from the decoder is written back; a failed write is logged and otherwise ignored.
    ///
    /// # Errors
    /// * [`Error::FileMissing`] if the file cannot be stat-ed
    /// * [`Error::NotVideo`] if it has zero width, height or duration
    /// * [`Error::Decoder`] if its metadata could not be read
    /// * anything [`FrameCompositor::composite`] rejects the video for
    /// * [`Error::DegenerateContent`] if every hash slot came out zero
    pub fn process(&self, path: impl AsRef<Path>) -> Result<HashedVideo, Error> {
        let path = path.as_ref();

        let file_meta = fs::metadata(path).map_err(|_e| Error::FileMissing(path.to_path_buf()))?;
        let modified = file_meta
            .modified()
            .map_err(|_e| Error::FileMissing(path.to_path_buf()))?;
        let cache_id = CacheId::new(path, modified);

        let metadata = self.metadata(path, &cache_id)?;
        if !metadata.is_video() {
            return Err(Error::NotVideo);
        }

        let record = VideoRecord::new(path, file_meta.len(), modified, &metadata);

        let cached = self.cached_captures(path, &cache_id);
        let composite = self.compositor.composite(&record, &cached)?;

        for (percent, capture) in composite.new_captures {
            self.save_capture(path, &cache_id, percent, &capture);
        }

        let fingerprint = FingerprintBuilder::new(self.layout.hash_slots()).build(&composite.image)?;
        if fingerprint.is_degenerate() {
            return Err(Error::DegenerateContent);
        }

        let thumbnail = FingerprintBuilder::archival_thumbnail(&composite.image).unwrap_or_else(|e| {
            warn!(target: "fingerprinting", "{}: no archival thumbnail: {e}", path.display());
            vec![]
        });

        debug!(target: "fingerprinting", "fingerprinted {}", path.display());
        Ok(HashedVideo::new(record, fingerprint, thumbnail))
    }

    fn metadata(&self, path: &Path, cache_id: &CacheId) -> Result<VideoMetadata, Error> {
        if let Some(metadata) = self.store.read_metadata(cache_id) {
            trace!(target: "fingerprinting", "{}: cached metadata", path.display());
            return Ok(metadata);
        }

        let metadata = self.decoder.video_metadata(path)?;
        if let Err(e) = self.store.write_metadata(cache_id, &metadata) {
            warn!(target: "fingerprinting", "{}: failed to store metadata: {e}", path.display());
        }
        Ok(metadata)
    }

    fn cached_captures(&self, path: &Path, cache_id: &CacheId) -> BTreeMap<u32, RgbImage> {
        self.layout
            .percentages()
            .iter()
            .filter_map(|&percent| {
                let jpeg = self.store.read_capture(cache_id, percent)?;
                match decode_jpeg(&jpeg) {
                    Ok(capture) => Some((percent, capture)),
                    Err(e) => {
                        warn!(
                            target: "fingerprinting",
                            "{}: ignoring unreadable capture at {percent}%: {e}",
                            path.display()
                        );
                        None
                    }
                }
            })
            .collect()
    }

    fn save_capture(&self, path: &Path, cache_id: &CacheId, percent: u32, capture: &RgbImage) {
        let saved = encode_jpeg(capture, THUMB_JPEG_QUALITY)
            .map_err(|e| e.to_string())
            .and_then(|jpeg| {
                self.store
                    .write_capture(cache_id, percent, jpeg)
                    .map_err(|e| e.to_string())
            });

        if let Err(e) = saved {
            warn!(
                target: "fingerprinting",
                "{}: failed to store capture at {percent}%: {e}",
                path.display()
            );
        }
    }
}
