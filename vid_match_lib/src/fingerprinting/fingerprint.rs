use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{definitions::SEGMENTED_HASH_SLOTS, Error};

/// How many independent hash slots are cut from a composite thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashSlots {
    /// One hash of the whole composite.
    #[default]
    Whole,
    /// One hash per cell of a 4x4 division of the composite.
    Segmented,
}

impl HashSlots {
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Whole => 1,
            Self::Segmented => SEGMENTED_HASH_SLOTS,
        }
    }

    /// (columns, rows) the composite is divided into.
    #[must_use]
    pub const fn grid(self) -> (u32, u32) {
        match self {
            Self::Whole => (1, 1),
            Self::Segmented => (4, 4),
        }
    }
}

/// Perceptual hashes of a video plus the grayscale matrices used for structural
/// similarity, one of each per hash slot.
///
/// A zero hash marks a slot whose sample was (nearly) monochrome. It never matches
/// anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    hashes: Vec<u64>,
    ssim_matrices: Vec<Array2<f64>>,
}

impl Fingerprint {
    /// # Errors
    /// Returns [`Error::InvalidFingerprint`] if there are no slots, if the number of hashes
    /// and matrices differ, or if the matrices are not all the same square size.
    pub fn new(hashes: Vec<u64>, ssim_matrices: Vec<Array2<f64>>) -> Result<Self, Error> {
        if hashes.is_empty() {
            return Err(Error::InvalidFingerprint("no hash slots".to_string()));
        }

        if hashes.len() != ssim_matrices.len() {
            return Err(Error::InvalidFingerprint(format!(
                "{} hashes but {} similarity matrices",
                hashes.len(),
                ssim_matrices.len()
            )));
        }

        let first_dim = ssim_matrices[0].dim();
        if first_dim.0 != first_dim.1 || ssim_matrices.iter().any(|m| m.dim() != first_dim) {
            return Err(Error::InvalidFingerprint(
                "similarity matrices must all be the same square size".to_string(),
            ));
        }

        Ok(Self {
            hashes,
            ssim_matrices,
        })
    }

    #[must_use]
    pub fn hashes(&self) -> &[u64] {
        &self.hashes
    }

    #[must_use]
    pub fn ssim_matrices(&self) -> &[Array2<f64>] {
        &self.ssim_matrices
    }

    /// Number of hash slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Every slot is zero, so the video can never match anything.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.hashes.iter().all(|&hash| hash == 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mismatched_slots_are_rejected() {
        let m = Array2::zeros((16, 16));
        assert!(Fingerprint::new(vec![], vec![]).is_err());
        assert!(Fingerprint::new(vec![1, 2], vec![m.clone()]).is_err());
        assert!(Fingerprint::new(vec![1, 2], vec![m.clone(), Array2::zeros((8, 8))]).is_err());
        assert!(Fingerprint::new(vec![1], vec![Array2::zeros((8, 16))]).is_err());
        assert!(Fingerprint::new(vec![1, 2], vec![m.clone(), m]).is_ok());
    }

    #[test]
    fn test_degenerate_only_when_every_slot_is_zero() {
        let m = || Array2::zeros((4, 4));
        let partly = Fingerprint::new(vec![0, 0, 7], vec![m(), m(), m()]).unwrap();
        let fully = Fingerprint::new(vec![0, 0, 0], vec![m(), m(), m()]).unwrap();

        assert!(!partly.is_degenerate());
        assert!(fully.is_degenerate());
    }
}
