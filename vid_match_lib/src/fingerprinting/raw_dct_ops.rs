use ndarray::prelude::*;
use rustdct::DctPlanner;

/// Orthonormal 2D DCT-II of a square matrix (the same scaling as OpenCV's `cv::dct`).
pub fn dct_2d(matrix: &Array2<f64>) -> Array2<f64> {
    let mut matrix = matrix.as_standard_layout().into_owned();

    //first check that the supplied matrix is square
    assert!(matrix.is_square());
    let (len, _) = matrix.dim();

    //setup the DCT.....
    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(len);

    //rustdct's DCT-II is unnormalized. Scale each output to make the transform orthonormal.
    let dc_scale = (1.0 / len as f64).sqrt();
    let ac_scale = (2.0 / len as f64).sqrt();

    //round 1 on rows, round 2 on (transposed) columns.
    for _round in 0..2 {
        matrix.rows_mut().into_iter().for_each(|mut row| {
            let row = row.as_slice_mut().expect("unreachable");
            dct.process_dct2(row);
            for (k, val) in row.iter_mut().enumerate() {
                *val *= if k == 0 { dc_scale } else { ac_scale };
            }
        });

        matrix = transpose_2d(matrix);
    }

    matrix
}

//rustdct requires the data to have row major alignment (e.g a stride of {WIDTH, 1}), however
//ndarray's transposition tools transpose by changing stride to {1, WIDTH} instead of shuffling
//data in memory.
//This function tranposes by shuffling in memory.
fn transpose_2d(matrix: Array2<f64>) -> Array2<f64> {
    Array::from_shape_vec(
        matrix.raw_dim(),
        matrix.reversed_axes().iter().copied().collect(),
    )
    .expect("unreachable")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_constant_matrix_has_only_dc() {
        let matrix = Array2::from_elem((8, 8), 3.0);
        let dct = dct_2d(&matrix);

        //orthonormal: DC = mean * N
        assert!((dct[[0, 0]] - 24.0).abs() < 1e-9);
        for ((y, x), val) in dct.indexed_iter() {
            if (y, x) != (0, 0) {
                assert!(val.abs() < 1e-9, "({y}, {x}) = {val}");
            }
        }
    }

    #[test]
    fn test_energy_is_preserved() {
        let matrix = Array2::from_shape_fn((16, 16), |(y, x)| ((y * 7 + x * 3) % 11) as f64);
        let dct = dct_2d(&matrix);

        let energy = |m: &Array2<f64>| m.iter().map(|v| v * v).sum::<f64>();
        assert!((energy(&matrix) - energy(&dct)).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_cosine_lands_in_first_row() {
        let n = 8;
        let matrix = Array2::from_shape_fn((n, n), |(_y, x)| {
            (std::f64::consts::PI / n as f64 * (x as f64 + 0.5) * 2.0).cos()
        });
        let dct = dct_2d(&matrix);

        //a pure horizontal frequency 2 has all its energy at row 0, column 2.
        let (peak, _) = dct
            .indexed_iter()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .unwrap();
        assert_eq!(peak, (0, 2));
    }
}
