use crate::{Fingerprint, VideoRecord};

/// A video that has been fingerprinted and can take part in matching. Never modified once
/// built.
#[derive(Debug, Clone, PartialEq)]
pub struct HashedVideo {
    record: VideoRecord,
    fingerprint: Fingerprint,
    thumbnail_jpeg: Vec<u8>,
}

impl HashedVideo {
    #[must_use]
    pub fn new(record: VideoRecord, fingerprint: Fingerprint, thumbnail_jpeg: Vec<u8>) -> Self {
        Self {
            record,
            fingerprint,
            thumbnail_jpeg,
        }
    }

    #[must_use]
    pub fn record(&self) -> &VideoRecord {
        &self.record
    }

    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// The composite thumbnail, shrunk and JPEG encoded for display. May be empty if
    /// encoding failed.
    #[must_use]
    pub fn thumbnail_jpeg(&self) -> &[u8] {
        &self.thumbnail_jpeg
    }
}
