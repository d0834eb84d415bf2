use std::num::NonZeroU32;

use image::RgbImage;
use ndarray::Array2;
use vid_match_common::{
    crop_resize_gray, encode_jpeg, gray_samples_f32, minimize_image, Crop, ThumbnailCodecError,
};

use crate::{
    definitions::{ARCHIVE_THUMB_MAX_DIMS, PHASH_SAMPLE_SIZE, SSIM_MATRIX_SIZE, THUMB_JPEG_QUALITY},
    Error, Fingerprint, HashSlots,
};

use super::phash::phash;

/// Turns a composite thumbnail into a [`Fingerprint`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintBuilder {
    slots: HashSlots,
}

impl FingerprintBuilder {
    #[must_use]
    pub const fn new(slots: HashSlots) -> Self {
        Self { slots }
    }

    /// Hash every slot of the composite and keep a small grayscale matrix of each for the
    /// slow comparison.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFingerprint`] if the composite is too small to be divided
    /// into the requested slots.
    pub fn build(&self, composite: &RgbImage) -> Result<Fingerprint, Error> {
        let phash_size = NonZeroU32::new(PHASH_SAMPLE_SIZE).expect("nonzero constant");
        let ssim_size = NonZeroU32::new(SSIM_MATRIX_SIZE).expect("nonzero constant");
        let (cols, rows) = self.slots.grid();

        let slots = (0..cols * rows)
            .map(|idx| {
                let crop = Crop::grid_cell(composite.dimensions(), cols, rows, idx).ok_or_else(
                    || {
                        Error::InvalidFingerprint(format!(
                            "composite {:?} too small for {cols}x{rows} slots",
                            composite.dimensions()
                        ))
                    },
                )?;

                let phash_sample = crop_resize_gray(composite, phash_size, phash_size, crop);
                let ssim_sample = crop_resize_gray(composite, ssim_size, ssim_size, crop);

                let ssim_matrix = Array2::from_shape_vec(
                    (SSIM_MATRIX_SIZE as usize, SSIM_MATRIX_SIZE as usize),
                    gray_samples_f32(&ssim_sample)
                        .into_iter()
                        .map(f64::from)
                        .collect(),
                )
                .expect("sample is SSIM_MATRIX_SIZE square");

                Ok((phash(&phash_sample), ssim_matrix))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let (hashes, ssim_matrices) = slots.into_iter().unzip();
        Fingerprint::new(hashes, ssim_matrices)
    }

    /// The composite shrunk to fit [`ARCHIVE_THUMB_MAX_DIMS`] and encoded as a JPEG, for
    /// display by a front end.
    pub fn archival_thumbnail(composite: &RgbImage) -> Result<Vec<u8>, ThumbnailCodecError> {
        let small = minimize_image(composite, ARCHIVE_THUMB_MAX_DIMS);
        encode_jpeg(&small, THUMB_JPEG_QUALITY)
    }
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;

    fn checkerboard(width: u32, height: u32, square: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x / square + y / square) % 2 == 0 {
                Rgb([230, 230, 230])
            } else {
                Rgb([20, 20, 20])
            }
        })
    }

    #[test]
    fn test_whole_composite_has_one_slot() {
        let fp = FingerprintBuilder::new(HashSlots::Whole)
            .build(&checkerboard(320, 240, 40))
            .unwrap();

        assert_eq!(fp.len(), 1);
        assert_ne!(fp.hashes()[0], 0);
        assert_eq!(fp.ssim_matrices()[0].dim(), (16, 16));
    }

    #[test]
    fn test_segmented_blank_cells_are_zero() {
        //top-left quarter has content, every other cell is flat grey.
        let mut composite = RgbImage::from_pixel(320, 240, Rgb([90, 90, 90]));
        let content = checkerboard(80, 60, 10);
        for (x, y, px) in content.enumerate_pixels() {
            composite.put_pixel(x, y, *px);
        }

        let fp = FingerprintBuilder::new(HashSlots::Segmented)
            .build(&composite)
            .unwrap();

        assert_eq!(fp.len(), 16);
        assert_ne!(fp.hashes()[0], 0);
        assert!(fp.hashes()[1..].iter().all(|&h| h == 0));
        assert!(!fp.is_degenerate());
    }

    #[test]
    fn test_blank_composite_is_degenerate() {
        let fp = FingerprintBuilder::new(HashSlots::Segmented)
            .build(&RgbImage::new(64, 64))
            .unwrap();
        assert!(fp.is_degenerate());
    }

    #[test]
    fn test_tiny_composite_cannot_be_segmented() {
        let res = FingerprintBuilder::new(HashSlots::Segmented).build(&RgbImage::new(3, 3));
        assert!(matches!(res, Err(Error::InvalidFingerprint(_))));
    }

    #[test]
    fn test_archival_thumbnail_is_capped() {
        let jpeg = FingerprintBuilder::archival_thumbnail(&checkerboard(1280, 720, 64)).unwrap();
        let decoded = vid_match_common::decode_jpeg(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (448, 252));
    }
}
