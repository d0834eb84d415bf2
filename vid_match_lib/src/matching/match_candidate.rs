use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{HashedVideo, Similarity};

/// Two matching videos, identified by their position in the collection that was searched
/// and by path, plus the score that made them match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    left_idx: usize,
    right_idx: usize,
    left_path: PathBuf,
    right_path: PathBuf,
    similarity: Similarity,
}

impl MatchCandidate {
    pub(crate) fn new(
        videos: &[HashedVideo],
        left_idx: usize,
        right_idx: usize,
        similarity: Similarity,
    ) -> Self {
        Self {
            left_idx,
            right_idx,
            left_path: videos[left_idx].record().path().to_path_buf(),
            right_path: videos[right_idx].record().path().to_path_buf(),
            similarity,
        }
    }

    /// (left, right) positions in the searched collection. `left < right`.
    #[must_use]
    pub const fn indices(&self) -> (usize, usize) {
        (self.left_idx, self.right_idx)
    }

    #[must_use]
    pub fn left_path(&self) -> &Path {
        &self.left_path
    }

    #[must_use]
    pub fn right_path(&self) -> &Path {
        &self.right_path
    }

    #[must_use]
    pub const fn similarity(&self) -> Similarity {
        self.similarity
    }
}

/// The result of stepping a scan or a match set one match forward or backward.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep<T> {
    Found(T),
    /// There are no more matches in the requested direction. The cursor is unchanged.
    Exhausted,
}

impl<T> ScanStep<T> {
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(val) => Some(val),
            Self::Exhausted => None,
        }
    }
}
