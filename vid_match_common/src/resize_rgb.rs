use std::num::NonZeroU32;

use image::{imageops, imageops::FilterType, RgbImage};

#[must_use]
pub fn resize_img_rgb(frame: &RgbImage, new_width: NonZeroU32, new_height: NonZeroU32) -> RgbImage {
    if frame.dimensions() == (new_width.get(), new_height.get()) {
        return frame.clone();
    }

    imageops::resize(
        frame,
        new_width.get(),
        new_height.get(),
        FilterType::Triangle,
    )
}

/// Scale `(width, height)` down so that it fits inside `(max_width, max_height)`, keeping
/// the aspect ratio. Dimensions that already fit are returned unchanged. Neither returned
/// dimension is ever zero.
#[must_use]
pub fn fit_within((width, height): (u32, u32), (max_width, max_height): (u32, u32)) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width.max(1), height.max(1));
    }

    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );

    let scaled = |dim: u32| ((f64::from(dim) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

#[cfg(test)]
mod test {
    use super::fit_within;

    #[test]
    fn test_fit_within_keeps_aspect() {
        assert_eq!(fit_within((1920, 1080), (320, 240)), (320, 180));
        assert_eq!(fit_within((1080, 1920), (320, 240)), (135, 240));
        assert_eq!(fit_within((100, 50), (320, 240)), (100, 50));
        assert_eq!(fit_within((10000, 1), (320, 240)), (320, 1));
    }
}
