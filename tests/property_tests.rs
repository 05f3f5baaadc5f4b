#[cfg(test)]
mod property_tests {
    use pallas::activations::Activation;
    use pallas::matrix::Matrix;
    use proptest::prelude::*;

    // Strategy for generating small matrices with finite entries
    fn matrix_strategy(rows: usize, columns: usize) -> impl Strategy<Value = Matrix> {
        prop::collection::vec(-10.0f64..10.0, rows * columns)
            .prop_map(move |v| Matrix::from_shape_vec(rows, columns, v).unwrap())
    }

    fn shaped_matrix() -> impl Strategy<Value = Matrix> {
        (1usize..=6, 1usize..=6).prop_flat_map(|(r, c)| matrix_strategy(r, c))
    }

    fn matrix_pair() -> impl Strategy<Value = (Matrix, Matrix)> {
        (1usize..=5, 1usize..=5, 1usize..=5)
            .prop_flat_map(|(m, k, n)| (matrix_strategy(m, k), matrix_strategy(k, n)))
    }

    proptest! {
        #[test]
        fn test_transpose_is_an_involution(a in shaped_matrix()) {
            let mut t = Matrix::new(a.columns(), a.rows());
            let mut back = Matrix::new(a.rows(), a.columns());
            Matrix::transpose_into(&a, &mut t);
            Matrix::transpose_into(&t, &mut back);
            prop_assert_eq!(back, a);
        }

        #[test]
        fn test_dot_transpose_matches_transposed_product((a, b) in matrix_pair()) {
            let (m, n) = (a.rows(), b.columns());
            let mut fused = Matrix::new(n, m);
            Matrix::dot_transpose_into(&a, &b, &mut fused);

            let mut product = Matrix::new(m, n);
            let mut expected = Matrix::new(n, m);
            Matrix::dot_into(&a, &b, &mut product);
            Matrix::transpose_into(&product, &mut expected);

            for (x, y) in fused.as_array().iter().zip(expected.as_array().iter()) {
                prop_assert!((x - y).abs() <= 1e-9 * (1.0 + y.abs()));
            }
        }

        #[test]
        fn test_record_round_trip_is_bit_exact(a in shaped_matrix()) {
            let mut bytes = Vec::new();
            a.write(&mut bytes).unwrap();
            prop_assert_eq!(bytes.len(), 8 + 8 * a.len());

            let b = Matrix::try_read(&mut bytes.as_slice()).unwrap();
            prop_assert_eq!(b.shape(), a.shape());
            for (x, y) in a.as_array().iter().zip(b.as_array().iter()) {
                prop_assert_eq!(x.to_bits(), y.to_bits());
            }
        }

        #[test]
        fn test_activations_stay_in_range(x in -50.0f64..50.0) {
            let s = Activation::Sigmoid.apply(x);
            prop_assert!((0.0..=1.0).contains(&s));
            let t = Activation::Tanh.apply(x);
            prop_assert!((-1.0..=1.0).contains(&t));
            prop_assert!(Activation::Relu.apply(x) >= 0.0);
            prop_assert!(Activation::Sigmoid.derivative(s) >= 0.0);
            prop_assert!(Activation::Tanh.derivative(t) >= 0.0);
        }
    }
}
