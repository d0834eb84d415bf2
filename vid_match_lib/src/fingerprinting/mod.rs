pub mod fingerprint;
pub mod fingerprint_builder;
pub mod frame_compositor;
pub mod phash;

mod raw_dct_ops;
