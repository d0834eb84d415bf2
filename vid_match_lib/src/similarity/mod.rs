pub mod hash_similarity;
pub mod ssim;
