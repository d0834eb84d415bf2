use serde::{Deserialize, Serialize};

use crate::definitions::{
    DEFAULT_DIFFERENT_DURATION_PENALTY, DEFAULT_SAME_DURATION_BONUS, HASH_BITS,
    SAME_DURATION_WINDOW_MS,
};

/// Adjustment applied to similarity scores depending on whether two videos have the same
/// length. Units are hash bits; the slow score uses the same value divided by 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationBias {
    pub same_duration_bonus: u32,
    pub different_duration_penalty: u32,
}

impl Default for DurationBias {
    fn default() -> Self {
        Self {
            same_duration_bonus: DEFAULT_SAME_DURATION_BONUS,
            different_duration_penalty: DEFAULT_DIFFERENT_DURATION_PENALTY,
        }
    }
}

impl DurationBias {
    /// `+bonus` if the durations are within one second of each other, `-penalty` otherwise.
    #[must_use]
    pub fn modifier(&self, left_ms: u64, right_ms: u64) -> i64 {
        if left_ms.abs_diff(right_ms) <= SAME_DURATION_WINDOW_MS {
            i64::from(self.same_duration_bonus)
        } else {
            -i64::from(self.different_duration_penalty)
        }
    }
}

/// The number of matching bits between two perceptual hashes, adjusted by `modifier` and
/// clamped to `0..=64`.
///
/// Returns `None` if either hash is zero: a zero hash marks an unusable (monochrome) slot.
#[must_use]
pub fn biased_matching_bits(left: u64, right: u64, modifier: i64) -> Option<u32> {
    if left == 0 || right == 0 {
        return None;
    }

    let matching_bits = i64::from(HASH_BITS - (left ^ right).count_ones());
    let biased = (matching_bits + modifier).clamp(0, i64::from(HASH_BITS));

    Some(biased as u32)
}

/// The fast score of two hashes belonging to videos with the given durations.
#[must_use]
pub fn hash_similarity(
    left: u64,
    right: u64,
    left_duration_ms: u64,
    right_duration_ms: u64,
    bias: &DurationBias,
) -> Option<u32> {
    biased_matching_bits(left, right, bias.modifier(left_duration_ms, right_duration_ms))
}
