#![allow(clippy::let_and_return)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]

// #![warn(clippy::cast_possible_truncation)]
// #![warn(clippy::cast_precision_loss)]

pub mod compositing;
mod crop;
pub mod resize_gray;
pub mod resize_rgb;
pub mod thumbnail;

pub use compositing::CompositeGrid;
pub use crop::Crop;
pub use resize_gray::{crop_resize_gray, gray_samples_f32};
pub use resize_rgb::{fit_within, resize_img_rgb};
pub use thumbnail::{decode_jpeg, encode_jpeg, minimize_image, ThumbnailCodecError};
