use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::matrix::Matrix;

fn m(rows: usize, columns: usize, values: &[f64]) -> Matrix {
    Matrix::from_shape_vec(rows, columns, values.to_vec()).unwrap()
}

#[test]
fn test_new_is_zeroed() {
    let matrix = Matrix::new(3, 4);
    assert_eq!(matrix.shape(), (3, 4));
    assert_eq!(matrix.len(), 12);
    assert!(matrix.as_array().iter().all(|&v| v == 0.0));
}

#[test]
fn test_from_shape_vec_rejects_wrong_length() {
    assert!(Matrix::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0]).is_err());
}

#[test]
fn test_clone_is_independent() {
    let original = m(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let mut clone = original.clone();
    clone.set(0, 0, 99.0);
    assert_eq!(original.get(0, 0), 1.0);
    assert_eq!(clone.get(0, 0), 99.0);
}

#[test]
fn test_clear_fill_copy() {
    let mut matrix = m(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    matrix.fill(7.5);
    assert!(matrix.as_array().iter().all(|&v| v == 7.5));

    matrix.clear();
    assert!(matrix.as_array().iter().all(|&v| v == 0.0));

    let src = m(2, 2, &[4.0, 3.0, 2.0, 1.0]);
    matrix.copy_from(&src);
    assert_eq!(matrix, src);
}

#[test]
fn test_randomize_within_bounds() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut matrix = Matrix::new(20, 20);
    matrix.randomize(-0.5, 2.0, &mut rng);
    assert!(matrix.as_array().iter().all(|&v| (-0.5..=2.0).contains(&v)));
    assert!(matrix.as_array().iter().any(|&v| v != matrix.get(0, 0)));
}

#[test]
fn test_randomize_is_reproducible_with_seed() {
    let mut a = Matrix::new(3, 3);
    let mut b = Matrix::new(3, 3);
    a.randomize(-1.0, 1.0, &mut StdRng::seed_from_u64(9));
    b.randomize(-1.0, 1.0, &mut StdRng::seed_from_u64(9));
    assert_eq!(a, b);
}

#[test]
fn test_elementwise_arithmetic() {
    let a = m(1, 3, &[1.0, 2.0, 3.0]);
    let b = m(1, 3, &[0.5, -1.0, 4.0]);

    let mut result = Matrix::new(1, 3);
    Matrix::sum_into(&a, &b, &mut result);
    assert_eq!(result, m(1, 3, &[1.5, 1.0, 7.0]));

    Matrix::difference_into(&a, &b, &mut result);
    assert_eq!(result, m(1, 3, &[0.5, 3.0, -1.0]));

    let mut c = a.clone();
    c += &b;
    assert_eq!(c, m(1, 3, &[1.5, 1.0, 7.0]));
    c -= &b;
    assert_eq!(c, a);

    c *= 2.0;
    assert_eq!(c, m(1, 3, &[2.0, 4.0, 6.0]));
    c /= 4.0;
    assert_eq!(c, m(1, 3, &[0.5, 1.0, 1.5]));

    c.odot(&b);
    assert_eq!(c, m(1, 3, &[0.25, -1.0, 6.0]));
}

#[test]
fn test_dot() {
    let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = m(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    let mut result = Matrix::new(2, 2);
    Matrix::dot_into(&a, &b, &mut result);
    assert_eq!(result, m(2, 2, &[58.0, 64.0, 139.0, 154.0]));
}

#[test]
fn test_dot_overwrites_previous_result() {
    let a = m(1, 1, &[2.0]);
    let b = m(1, 1, &[3.0]);
    let mut result = m(1, 1, &[100.0]);
    Matrix::dot_into(&a, &b, &mut result);
    assert_eq!(result.get(0, 0), 6.0);
}

#[test]
fn test_transpose() {
    let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let mut t = Matrix::new(3, 2);
    Matrix::transpose_into(&a, &mut t);
    assert_eq!(t, m(3, 2, &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]));
}

#[test]
fn test_dot_transpose_matches_dot_then_transpose() {
    let a = m(2, 3, &[1.0, -2.0, 3.0, 0.5, 5.0, -6.0]);
    let b = m(3, 4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);

    let mut product = Matrix::new(2, 4);
    Matrix::dot_into(&a, &b, &mut product);
    let mut expected = Matrix::new(4, 2);
    Matrix::transpose_into(&product, &mut expected);

    let mut fused = Matrix::new(4, 2);
    Matrix::dot_transpose_into(&a, &b, &mut fused);
    assert_eq!(fused, expected);
}

#[test]
fn test_sum_rows_transpose_broadcasts() {
    // 3 samples x 2 outputs
    let deltas = m(3, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    let mut result = m(2, 3, &[9.0; 6]);
    Matrix::sum_rows_transpose_into(&deltas, &mut result);
    assert_eq!(result, m(2, 3, &[6.0, 6.0, 6.0, 60.0, 60.0, 60.0]));
}

#[test]
fn test_apply() {
    let mut matrix = m(1, 3, &[-1.0, 0.0, 2.0]);
    matrix.apply(|v| v * v + 1.0);
    assert_eq!(matrix, m(1, 3, &[2.0, 1.0, 5.0]));
}

#[test]
fn test_row_segments() {
    let src = m(2, 4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let mut dst = Matrix::new(2, 3);
    dst.copy_row_segment(1, 1, &src, 1, 2, 2);
    assert_eq!(dst, m(2, 3, &[0.0, 0.0, 0.0, 0.0, 7.0, 8.0]));

    dst.set_row_segment(0, 0, &[-1.0, -2.0]);
    assert_eq!(dst.row(0).to_vec(), vec![-1.0, -2.0, 0.0]);
}

#[test]
fn test_norm_and_mean() {
    let matrix = m(1, 2, &[3.0, 4.0]);
    assert_eq!(matrix.norm(), 5.0);
    assert_eq!(matrix.mean(), 3.5);
    assert_eq!(Matrix::empty().mean(), 0.0);
}

#[test]
fn test_save_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matrix.bin");
    let matrix = m(2, 3, &[0.1, -0.2, 1e-300, f64::MAX, -0.0, 3.0]);

    matrix.save(&path).unwrap();
    let loaded = Matrix::load(&path);

    assert_eq!(loaded.shape(), (2, 3));
    for (a, b) in matrix.as_array().iter().zip(loaded.as_array().iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_load_missing_file_yields_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Matrix::load(dir.path().join("does-not-exist.bin"));
    assert!(loaded.is_empty());
    assert_eq!(loaded.shape(), (0, 0));
}
