use serde::{Deserialize, Serialize};

use crate::{
    definitions::{
        DEFAULT_BAD_NAME_PATTERN, DEFAULT_FAST_LOWER, DEFAULT_FAST_UPPER, DEFAULT_MIN_DURATION_MS,
        DEFAULT_MIN_SIZE_BYTES, DEFAULT_SLOW_LOWER, DEFAULT_SLOW_UPPER, DEFAULT_SSIM_BLOCK_SIZE,
        HASH_BITS,
    },
    DurationBias, HashSlots,
};

/// Smallest gap kept between the bounds of the slow band when one bound is pushed past
/// the other.
pub const SLOW_BAND_SEPARATION: f64 = 0.01;

/// Slow bounds are clamped to `-SLOW_BOUND_LIMIT..=SLOW_BOUND_LIMIT`. Slow scores are an SSIM
/// index (at most 1) plus a duration bias, so larger bounds mean nothing, and at very large
/// magnitudes adding [`SLOW_BAND_SEPARATION`] would no longer change the value.
pub const SLOW_BOUND_LIMIT: f64 = 1_000.0;

/// Which scores decide whether two videos match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Only the perceptual hash score.
    #[default]
    FastOnly,
    /// The perceptual hash score selects candidates, structural similarity decides.
    Hybrid,
}

/// An acceptance window for a score: `lower < score <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand<T> {
    lower: T,
    upper: T,
}

impl<T: PartialOrd + Copy> ThresholdBand<T> {
    #[must_use]
    pub fn lower(&self) -> T {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> T {
        self.upper
    }

    #[must_use]
    pub fn contains(&self, score: T) -> bool {
        self.lower < score && score <= self.upper
    }
}

/// The fast (matching bits, `0..=64`) and slow (structural similarity) acceptance bands.
///
/// Every setter keeps `upper > lower` in both bands: moving one bound past the other pushes
/// the other along with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "UncheckedThresholds")]
pub struct ThresholdConfig {
    fast: ThresholdBand<u32>,
    slow: ThresholdBand<f64>,
}

#[derive(Deserialize)]
struct UncheckedThresholds {
    fast: ThresholdBand<u32>,
    slow: ThresholdBand<f64>,
}

impl From<UncheckedThresholds> for ThresholdConfig {
    fn from(raw: UncheckedThresholds) -> Self {
        Self::new(raw.fast.lower, raw.fast.upper, raw.slow.lower, raw.slow.upper)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_FAST_LOWER,
            DEFAULT_FAST_UPPER,
            DEFAULT_SLOW_LOWER,
            DEFAULT_SLOW_UPPER,
        )
    }
}

impl ThresholdConfig {
    /// Bounds are applied lower first, then upper, so if they conflict the upper bound wins.
    #[must_use]
    pub fn new(fast_lower: u32, fast_upper: u32, slow_lower: f64, slow_upper: f64) -> Self {
        let mut ret = Self {
            fast: ThresholdBand {
                lower: DEFAULT_FAST_LOWER,
                upper: DEFAULT_FAST_UPPER,
            },
            slow: ThresholdBand {
                lower: DEFAULT_SLOW_LOWER,
                upper: DEFAULT_SLOW_UPPER,
            },
        };
        ret.set_fast_lower(fast_lower);
        ret.set_fast_upper(fast_upper);
        ret.set_slow_lower(slow_lower);
        ret.set_slow_upper(slow_upper);
        ret
    }

    #[must_use]
    pub const fn fast(&self) -> ThresholdBand<u32> {
        self.fast
    }

    #[must_use]
    pub const fn slow(&self) -> ThresholdBand<f64> {
        self.slow
    }

    /// Clamped to `0..=63`.
    pub fn set_fast_lower(&mut self, lower: u32) {
        let lower = lower.min(HASH_BITS - 1);
        self.fast.lower = lower;
        if self.fast.upper <= lower {
            self.fast.upper = lower + 1;
        }
    }

    /// Clamped to `1..=64`.
    pub fn set_fast_upper(&mut self, upper: u32) {
        let upper = upper.clamp(1, HASH_BITS);
        self.fast.upper = upper;
        if self.fast.lower >= upper {
            self.fast.lower = upper - 1;
        }
    }

    /// Non-finite values are ignored. Clamped to `-SLOW_BOUND_LIMIT..SLOW_BOUND_LIMIT`.
    pub fn set_slow_lower(&mut self, lower: f64) {
        if !lower.is_finite() {
            return;
        }
        let lower = lower.clamp(-SLOW_BOUND_LIMIT, SLOW_BOUND_LIMIT - SLOW_BAND_SEPARATION);
        self.slow.lower = lower;
        if self.slow.upper <= lower {
            self.slow.upper = lower + SLOW_BAND_SEPARATION;
        }
    }

    /// Non-finite values are ignored. Clamped to `-SLOW_BOUND_LIMIT..=SLOW_BOUND_LIMIT`,
    /// leaving room below it for the lower bound.
    pub fn set_slow_upper(&mut self, upper: f64) {
        if !upper.is_finite() {
            return;
        }
        let upper = upper.clamp(-SLOW_BOUND_LIMIT + SLOW_BAND_SEPARATION, SLOW_BOUND_LIMIT);
        self.slow.upper = upper;
        if self.slow.lower >= upper {
            self.slow.lower = upper - SLOW_BAND_SEPARATION;
        }
    }

    /// Move both lower bounds together: the slow bound to `percent / 100` and the fast
    /// bound to the same fraction of 64 bits.
    pub fn set_lower_percent(&mut self, percent: u32) {
        self.set_slow_lower(f64::from(percent) / 100.0);
        self.set_fast_lower(percent_of_hash_bits(percent));
    }

    /// Move both upper bounds together, like [`Self::set_lower_percent`].
    pub fn set_upper_percent(&mut self, percent: u32) {
        self.set_slow_upper(f64::from(percent) / 100.0);
        self.set_fast_upper(percent_of_hash_bits(percent));
    }
}

fn percent_of_hash_bits(percent: u32) -> u32 {
    (f64::from(HASH_BITS) * f64::from(percent) / 100.0).round() as u32
}

/// Everything that decides whether two videos match. Passed by reference into every
/// matching operation so that one pass sees a single, unchanging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub mode: MatchMode,
    pub thresholds: ThresholdConfig,

    /// Files smaller than this never match.
    pub min_size_bytes: u64,

    /// Videos shorter than this never match.
    pub min_duration_ms: u64,

    pub duration_bias: DurationBias,

    /// How many slots of each fingerprint are compared. Fingerprints with fewer slots are
    /// compared on the slots they have.
    pub hash_slots: HashSlots,

    pub ssim_block_size: u32,

    /// Files whose names contain any of these never match.
    pub bad_name_patterns: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::default(),
            thresholds: ThresholdConfig::default(),
            min_size_bytes: DEFAULT_MIN_SIZE_BYTES,
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
            duration_bias: DurationBias::default(),
            hash_slots: HashSlots::default(),
            ssim_block_size: DEFAULT_SSIM_BLOCK_SIZE,
            bad_name_patterns: vec![DEFAULT_BAD_NAME_PATTERN.to_string()],
        }
    }
}
