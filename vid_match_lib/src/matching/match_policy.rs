use std::fmt;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::{
    definitions::{CLOSE_ENOUGH_BITS, HASH_BITS},
    similarity::{hash_similarity::biased_matching_bits, ssim::ssim},
    HashedVideo, MatchConfig, MatchMode,
};

/// The score that caused two videos to match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Similarity {
    /// Matching bits out of 64, duration biased.
    Fast(u32),
    /// Structural similarity, duration biased.
    Slow(f64),
}

impl Similarity {
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Fast(bits) => f64::from(*bits),
            Self::Slow(index) => *index,
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast(bits) => write!(f, "{bits}/{HASH_BITS} bits"),
            //the bias can push the index past 1, which is not meaningful to display.
            Self::Slow(index) => write!(f, "{:.3} SSIM", index.min(1.0)),
        }
    }
}

/// The outcome of comparing two videos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchVerdict {
    /// `Some` if the pair matches.
    pub similarity: Option<Similarity>,

    /// The best fast score over every slot pairing that was compared, whether or not the
    /// pair matched. Zero if the pair was filtered out before any comparison.
    pub best_fast_score: u32,
}

impl MatchVerdict {
    const INELIGIBLE: Self = Self {
        similarity: None,
        best_fast_score: 0,
    };

    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.similarity.is_some()
    }
}

/// Decides whether two videos match under a [`MatchConfig`]. Holds no state of its own, so
/// it can be shared freely between threads.
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy<'a> {
    config: &'a MatchConfig,
}

impl<'a> MatchPolicy<'a> {
    #[must_use]
    pub const fn new(config: &'a MatchConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &'a MatchConfig {
        self.config
    }

    /// Whether a single video passes the name, size and duration filters. A video that
    /// fails them never matches anything.
    #[must_use]
    pub fn is_eligible(&self, video: &HashedVideo) -> bool {
        let record = video.record();
        let name = record.file_name();

        let bad_name = self
            .config
            .bad_name_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()));

        !bad_name
            && record.size_bytes() >= self.config.min_size_bytes
            && record.duration_ms() >= self.config.min_duration_ms
    }

    /// Compare every slot of `left` against every slot of `right` and stop at the first
    /// pairing accepted by the configured mode.
    ///
    /// * Fast-only: the pair matches as soon as the best fast score over the pairings
    ///   compared so far is inside the fast band.
    /// * Hybrid: a pairing whose fast score is at least the fast lower bound (and at least
    ///   [`CLOSE_ENOUGH_BITS`]) gets a structural similarity score, biased by duration in
    ///   units of 1/64. It matches if that is inside the slow band.
    #[must_use]
    pub fn both_videos_match(&self, left: &HashedVideo, right: &HashedVideo) -> MatchVerdict {
        if !self.is_eligible(left) || !self.is_eligible(right) {
            return MatchVerdict::INELIGIBLE;
        }

        let cfg = self.config;
        let (l_fp, r_fp) = (left.fingerprint(), right.fingerprint());
        let slots = cfg.hash_slots.count();
        let l_slots = l_fp.len().min(slots);
        let r_slots = r_fp.len().min(slots);

        let modifier = cfg
            .duration_bias
            .modifier(left.record().duration_ms(), right.record().duration_ms());

        let slow_gate = cfg.thresholds.fast().lower().max(CLOSE_ENOUGH_BITS);

        let mut best_fast_score = 0;
        for (l_slot, r_slot) in iproduct!(0..l_slots, 0..r_slots) {
            let Some(fast_score) =
                biased_matching_bits(l_fp.hashes()[l_slot], r_fp.hashes()[r_slot], modifier)
            else {
                continue;
            };
            best_fast_score = best_fast_score.max(fast_score);

            let similarity = match cfg.mode {
                //the band applies to the best pairing so far, so once any pairing scores
                //above the upper bound the pair can no longer match.
                MatchMode::FastOnly => cfg
                    .thresholds
                    .fast()
                    .contains(best_fast_score)
                    .then_some(Similarity::Fast(best_fast_score)),

                MatchMode::Hybrid if fast_score >= slow_gate => {
                    let (l_matrix, r_matrix) =
                        (&l_fp.ssim_matrices()[l_slot], &r_fp.ssim_matrices()[r_slot]);

                    //fingerprints built with different matrix sizes are not comparable.
                    if l_matrix.dim() != r_matrix.dim() {
                        continue;
                    }

                    let slow_score = ssim(l_matrix, r_matrix, cfg.ssim_block_size as usize)
                        + modifier as f64 / f64::from(HASH_BITS);

                    cfg.thresholds
                        .slow()
                        .contains(slow_score)
                        .then_some(Similarity::Slow(slow_score))
                }

                MatchMode::Hybrid => None,
            };

            if similarity.is_some() {
                return MatchVerdict {
                    similarity,
                    best_fast_score,
                };
            }
        }

        MatchVerdict {
            similarity: None,
            best_fast_score,
        }
    }
}
