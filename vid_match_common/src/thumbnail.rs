use std::num::NonZeroU32;

use image::{codecs::jpeg::JpegEncoder, ImageFormat, RgbImage};
use thiserror::Error;

use crate::{fit_within, resize_img_rgb};

#[derive(Error, Debug)]
pub enum ThumbnailCodecError {
    #[error("Failed to encode thumbnail: {0}")]
    Encode(image::ImageError),

    #[error("Failed to decode thumbnail: {0}")]
    Decode(image::ImageError),
}

/// Shrink an image so that it fits inside `max_dims`, keeping its aspect ratio.
/// Images that already fit are returned unchanged.
#[must_use]
pub fn minimize_image(image: &RgbImage, max_dims: (u32, u32)) -> RgbImage {
    let (w, h) = fit_within(image.dimensions(), max_dims);
    let w = NonZeroU32::new(w).expect("fit_within never returns zero");
    let h = NonZeroU32::new(h).expect("fit_within never returns zero");
    resize_img_rgb(image, w, h)
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ThumbnailCodecError> {
    let mut buf = vec![];
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(image)
        .map_err(ThumbnailCodecError::Encode)?;
    Ok(buf)
}

pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage, ThumbnailCodecError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map(|img| img.to_rgb8())
        .map_err(ThumbnailCodecError::Decode)
}
