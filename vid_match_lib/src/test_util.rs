//! Builders for synthetic fingerprints and videos, for tests.

use std::{path::Path, time::UNIX_EPOCH};

use ndarray::Array2;
use rand::prelude::*;

use crate::{
    definitions::{HASH_BITS, SSIM_MATRIX_SIZE},
    Fingerprint, HashedVideo, MatchConfig, MatchMode, VideoMetadata, VideoRecord,
};

/// A random hash that is never zero.
pub fn random_hash(rng: &mut StdRng) -> u64 {
    loop {
        let hash = rng.gen::<u64>();
        if hash != 0 {
            return hash;
        }
    }
}

/// `hash` with exactly `distance` distinct bits flipped.
pub fn hash_with_distance(hash: u64, distance: u32, rng: &mut StdRng) -> u64 {
    assert!(distance <= HASH_BITS);

    let mut ret = hash;
    while (ret ^ hash).count_ones() < distance {
        let bit = rng.gen_range(0..HASH_BITS);
        if (ret ^ hash) & (1 << bit) == 0 {
            ret ^= 1 << bit;
        }
    }
    ret
}

/// A square matrix of random gray levels, the size the fingerprint builder produces.
pub fn random_ssim_matrix(rng: &mut StdRng) -> Array2<f64> {
    let side = SSIM_MATRIX_SIZE as usize;
    Array2::from_shape_fn((side, side), |_| rng.gen_range(0.0..=255.0))
}

/// A 640x480 video with the given hashes, random similarity matrices and a random size of
/// 100-200 MiB.
pub fn synthetic_video(
    path: impl AsRef<Path>,
    hashes: Vec<u64>,
    duration_ms: u64,
    rng: &mut StdRng,
) -> HashedVideo {
    let metadata = VideoMetadata {
        duration_ms,
        width: 640,
        height: 480,
        framerate: 25.0,
        bitrate_kbps: 2000,
        codec: "h264".to_string(),
        ..VideoMetadata::default()
    };
    let size_bytes = rng.gen_range(100 << 20..200 << 20);
    let record = VideoRecord::new(path, size_bytes, UNIX_EPOCH, &metadata);

    let matrices = hashes.iter().map(|_| random_ssim_matrix(rng)).collect();
    let fingerprint = Fingerprint::new(hashes, matrices).expect("synthetic fingerprint");

    HashedVideo::new(record, fingerprint, vec![])
}

/// The default configuration, minus every filter that synthetic videos would trip.
pub fn permissive_config(mode: MatchMode) -> MatchConfig {
    MatchConfig {
        mode,
        min_size_bytes: 0,
        min_duration_ms: 0,
        bad_name_patterns: vec![],
        ..MatchConfig::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hash_with_distance_is_exact() {
        let mut rng = StdRng::seed_from_u64(50);
        for distance in [0, 1, 17, 63, 64] {
            let hash = random_hash(&mut rng);
            let other = hash_with_distance(hash, distance, &mut rng);
            assert_eq!((hash ^ other).count_ones(), distance);
        }
    }
}
