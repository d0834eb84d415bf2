use std::num::NonZeroU32;

use image::{imageops, imageops::FilterType, GrayImage, RgbImage};

use crate::Crop;

/// Crop a region out of an RGB frame, shrink it to `new_width` x `new_height` and convert
/// it to grayscale.
///
/// The area-averaging filter used by most perceptual hashes is approximated with a
/// triangle filter, which also averages every source pixel when shrinking.
#[must_use]
pub fn crop_resize_gray(
    src_frame: &RgbImage,
    new_width: NonZeroU32,
    new_height: NonZeroU32,
    crop: Crop,
) -> GrayImage {
    let (left, top, width, height) = crop.as_view_args();
    let cropped = imageops::crop_imm(src_frame, left, top, width, height).to_image();
    let resized = imageops::resize(
        &cropped,
        new_width.get(),
        new_height.get(),
        FilterType::Triangle,
    );

    imageops::grayscale(&resized)
}

/// The luma values of a gray image as `f32`, row-major.
#[must_use]
pub fn gray_samples_f32(frame: &GrayImage) -> Vec<f32> {
    frame.as_raw().iter().copied().map(f32::from).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_resize_only_sees_cropped_region() {
        let mut frame = RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]));
        for x in 10..20 {
            for y in 0..10 {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let right_half = Crop::from_topleft_and_dims((20, 10), 10, 0, 10, 10);
        let eight = NonZeroU32::new(8).unwrap();

        let gray = crop_resize_gray(&frame, eight, eight, right_half);

        assert_eq!(gray.dimensions(), (8, 8));
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }
}
