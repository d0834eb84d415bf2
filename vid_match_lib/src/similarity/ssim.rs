use ndarray::{s, Array2, ArrayView2};

//stabilizing constants for 8 bit samples: (k * 255)^2
const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// Mean and (population) variance of a block.
pub fn local_stats(block: ArrayView2<f64>) -> (f64, f64) {
    let n = block.len() as f64;
    let mean = block.sum() / n;
    let variance = block.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance)
}

/// Covariance of two equally sized blocks with the given means.
pub fn covariance(b0: ArrayView2<f64>, b1: ArrayView2<f64>, mean0: f64, mean1: f64) -> f64 {
    let n = b0.len() as f64;
    b0.iter()
        .zip(b1.iter())
        .map(|(v0, v1)| (v0 - mean0) * (v1 - mean1))
        .sum::<f64>()
        / n
}

/// Structural similarity of two equally sized grayscale matrices, averaged over
/// non-overlapping `block_size` square blocks. Remainder rows and columns that do not fill
/// a whole block are ignored. A `block_size` of 0, or one larger than the matrix, is
/// treated as the whole matrix.
///
/// Returns 1.0 for identical inputs. Typical footage scores between 0 and 1.
///
/// # Panics
/// If the matrices differ in size or are empty.
#[must_use]
pub fn ssim(m0: &Array2<f64>, m1: &Array2<f64>, block_size: usize) -> f64 {
    assert_eq!(m0.dim(), m1.dim(), "ssim of differently sized matrices");
    let (rows, cols) = m0.dim();
    assert!(rows > 0 && cols > 0, "ssim of an empty matrix");

    let block = if block_size == 0 {
        rows.min(cols)
    } else {
        block_size.min(rows).min(cols)
    };

    let mut total = 0.0;
    let mut num_blocks = 0usize;

    for y in (0..=rows - block).step_by(block) {
        for x in (0..=cols - block).step_by(block) {
            let b0 = m0.slice(s![y..y + block, x..x + block]);
            let b1 = m1.slice(s![y..y + block, x..x + block]);

            let (mean0, var0) = local_stats(b0);
            let (mean1, var1) = local_stats(b1);
            let cov = covariance(b0, b1, mean0, mean1);

            let numerator = (2.0 * mean0 * mean1 + C1) * (2.0 * cov + C2);
            let denominator = (mean0 * mean0 + mean1 * mean1 + C1) * (var0 + var1 + C2);

            total += numerator / denominator;
            num_blocks += 1;
        }
    }

    total / num_blocks as f64
}
