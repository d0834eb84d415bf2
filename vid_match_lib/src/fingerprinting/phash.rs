use bitvec::prelude::*;
use image::GrayImage;
use ndarray::prelude::*;

use crate::definitions::{ALMOST_BLACK, HASH_BITS, PHASH_LOW_FREQ_SIZE, PHASH_SAMPLE_SIZE};

use super::raw_dct_ops::dct_2d;

/// True if the sample is (almost) one flat colour: the summed absolute difference of every
/// pixel from the first pixel is below [`ALMOST_BLACK`].
pub fn is_monochrome(sample: &GrayImage) -> bool {
    let mut pixels = sample.as_raw().iter().copied();
    let Some(first) = pixels.next() else {
        return true;
    };

    let shades_of_gray: u64 = pixels.map(|p| u64::from(first.abs_diff(p))).sum();
    shades_of_gray < ALMOST_BLACK
}

/// The 64 bit perceptual hash of a square grayscale sample (normally
/// [`PHASH_SAMPLE_SIZE`] x [`PHASH_SAMPLE_SIZE`]).
///
/// Bit `i` corresponds to low frequency DCT coefficient `(i / 8, i % 8)` and is set if that
/// coefficient is greater than the mean of the 63 non-DC coefficients. Monochrome samples
/// hash to zero, which marks the slot as unusable.
pub fn phash(sample: &GrayImage) -> u64 {
    debug_assert_eq!(sample.dimensions(), (PHASH_SAMPLE_SIZE, PHASH_SAMPLE_SIZE));

    if is_monochrome(sample) {
        return 0;
    }

    let (width, height) = sample.dimensions();
    let matrix = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        f64::from(sample.get_pixel(x as u32, y as u32).0[0])
    });

    let dct = dct_2d(&matrix);
    let low_freqs = dct.slice(s![..PHASH_LOW_FREQ_SIZE, ..PHASH_LOW_FREQ_SIZE]);

    //the DC coefficient is very large compared to the rest, so leave it out of the mean.
    let dc = low_freqs[[0, 0]];
    let average = (low_freqs.sum() - dc) / f64::from(HASH_BITS - 1);

    // Pack the raw bits of the hash into a bit vector.
    let mut bitarr: BitArray<[u64; 1], Lsb0> = BitArray::ZERO;
    for (mut bitarr_val, coef) in bitarr.iter_mut().zip(low_freqs.iter()) {
        *bitarr_val = *coef > average;
    }

    bitarr.into_inner()[0]
}

#[cfg(test)]
mod test {
    use image::Luma;

    use super::*;

    fn sample_from_fn(f: impl Fn(u32, u32) -> u8) -> GrayImage {
        GrayImage::from_fn(PHASH_SAMPLE_SIZE, PHASH_SAMPLE_SIZE, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn test_uniform_sample_hashes_to_zero() {
        for shade in [0, 17, 128, 255] {
            assert_eq!(phash(&sample_from_fn(|_, _| shade)), 0);
        }
    }

    #[test]
    fn test_faint_noise_still_counts_as_monochrome() {
        //1023 pixels, one of which differs by 1: well under the threshold.
        let sample = sample_from_fn(|x, y| if (x, y) == (5, 5) { 11 } else { 10 });
        assert!(is_monochrome(&sample));
        assert_eq!(phash(&sample), 0);
    }

    #[test]
    fn test_gradient_hashes_nonzero() {
        let sample = sample_from_fn(|x, y| (x * 4 + y * 2) as u8);
        assert!(!is_monochrome(&sample));
        assert_ne!(phash(&sample), 0);
    }

    #[test]
    fn test_brightness_shift_keeps_hash() {
        // adding a constant only changes the DC coefficient, which the mean ignores.
        let base = |x: u32, y: u32| ((x * 5 + y * 3) % 97) as u8;
        let dark = sample_from_fn(base);
        let light = sample_from_fn(|x, y| base(x, y) + 40);

        assert_eq!(phash(&dark), phash(&light));
    }

    #[test]
    fn test_mirrored_content_hashes_differently() {
        let sample = sample_from_fn(|x, y| (x * 6 + y) as u8);
        let mirrored = sample_from_fn(|x, y| ((PHASH_SAMPLE_SIZE - 1 - x) * 6 + y) as u8);

        let distance = (phash(&sample) ^ phash(&mirrored)).count_ones();
        assert!(distance > 0);
    }
}
