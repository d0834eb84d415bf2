use serde::{Deserialize, Serialize};

use crate::HashSlots;

//Side length of the grayscale square that the perceptual hash DCT is performed on.
pub const PHASH_SAMPLE_SIZE: u32 = 32;

//Side length of the top-left block of DCT coefficients that become hash bits.
pub const PHASH_LOW_FREQ_SIZE: usize = 8;

pub const HASH_BITS: u32 = (PHASH_LOW_FREQ_SIZE * PHASH_LOW_FREQ_SIZE) as u32;

//Side length of the grayscale matrices kept for structural similarity.
pub const SSIM_MATRIX_SIZE: u32 = 16;

//A phash sample whose summed absolute difference from its first pixel falls below this
//is considered monochrome and gets a zero hash.
pub const ALMOST_BLACK: u64 = 1500;

/// In hybrid mode the slow score is only computed once the fast score reaches at least this
/// many matching bits (or the fast lower bound, whichever is higher).
pub const CLOSE_ENOUGH_BITS: u32 = 44;

//Videos whose durations differ by no more than this get the same-duration bonus.
pub const SAME_DURATION_WINDOW_MS: u64 = 1000;

pub const SEGMENTED_HASH_SLOTS: usize = 16;

//Sampling retry policy. Every capture pass samples at `percent * fraction / 100` of the
//duration. A failed pass retries with the fraction reduced by the backward step.
pub const FIRST_PASS_FRACTION: u32 = 100;
pub const GO_BACKWARDS_PERCENT: u32 = 7;
pub const VIDEO_STILL_USABLE: u32 = 86;

/// Largest size of a single cell of the composite thumbnail.
pub const CELL_MAX_DIMS: (u32, u32) = (320, 240);

/// Largest size of the archival thumbnail and of cached per-offset captures.
pub const ARCHIVE_THUMB_MAX_DIMS: (u32, u32) = (448, 336);

pub const THUMB_JPEG_QUALITY: u8 = 60;

/// Default fast band: a pair matches when `57 < matching bits <= 64`.
pub const DEFAULT_FAST_LOWER: u32 = 57;
pub const DEFAULT_FAST_UPPER: u32 = 64;

/// Default slow band. The upper bound sits above the best attainable adjusted slow score
/// (1.0 plus the same-duration bonus) so that identical videos still match.
pub const DEFAULT_SLOW_LOWER: f64 = 0.89;
pub const DEFAULT_SLOW_UPPER: f64 = 2.0;

pub const DEFAULT_SAME_DURATION_BONUS: u32 = 1;
pub const DEFAULT_DIFFERENT_DURATION_PENALTY: u32 = 4;

/// 50 MiB
pub const DEFAULT_MIN_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// 5 minutes
pub const DEFAULT_MIN_DURATION_MS: u64 = 300_000;

pub const DEFAULT_SSIM_BLOCK_SIZE: u32 = 16;

/// Files whose names contain this are never matched.
pub const DEFAULT_BAD_NAME_PATTERN: &str = "error";

/// How many frames are sampled from a video, where in the video they come from, and how they
/// are laid out in the composite thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ThumbnailLayout {
    Thumb1,
    Thumb2,
    Thumb3,
    Thumb4,
    Thumb6,
    Thumb9,
    #[default]
    Thumb12,
    Thumb16,
    /// 4x4 grid of the same offsets as `Thumb16`, but each cell is hashed on its own.
    Segmented,
}

impl ThumbnailLayout {
    pub const ALL: [Self; 9] = [
        Self::Thumb1,
        Self::Thumb2,
        Self::Thumb3,
        Self::Thumb4,
        Self::Thumb6,
        Self::Thumb9,
        Self::Thumb12,
        Self::Thumb16,
        Self::Segmented,
    ];

    /// Look up a whole-thumbnail layout by its number of frames.
    #[must_use]
    pub fn from_num_frames(num_frames: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|layout| *layout != Self::Segmented)
            .find(|layout| layout.percentages().len() == num_frames as usize)
    }

    /// (columns, rows)
    #[must_use]
    pub const fn grid(self) -> (u32, u32) {
        match self {
            Self::Thumb1 => (1, 1),
            Self::Thumb2 => (2, 1),
            Self::Thumb3 => (3, 1),
            Self::Thumb4 => (2, 2),
            Self::Thumb6 => (3, 2),
            Self::Thumb9 => (3, 3),
            Self::Thumb12 => (4, 3),
            Self::Thumb16 | Self::Segmented => (4, 4),
        }
    }

    /// Offsets into the video, in percent of its duration, one per grid cell.
    #[must_use]
    pub const fn percentages(self) -> &'static [u32] {
        match self {
            Self::Thumb1 => &[48],
            Self::Thumb2 => &[32, 64],
            Self::Thumb3 => &[24, 48, 72],
            Self::Thumb4 => &[16, 40, 64, 88],
            Self::Thumb6 => &[8, 24, 40, 56, 72, 88],
            Self::Thumb9 => &[8, 16, 24, 40, 48, 56, 72, 80, 88],
            Self::Thumb12 => &[8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 88, 96],
            Self::Thumb16 | Self::Segmented => {
                &[8, 16, 24, 32, 36, 40, 48, 52, 56, 60, 64, 68, 72, 80, 88, 96]
            }
        }
    }

    #[must_use]
    pub const fn hash_slots(self) -> HashSlots {
        match self {
            Self::Segmented => HashSlots::Segmented,
            _ => HashSlots::Whole,
        }
    }
}
