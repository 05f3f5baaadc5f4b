use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::activations::Activation;
use crate::matrix::Matrix;
use crate::optimizer::GradientClipper;

/// A fully connected layer with storage for one fixed-size batch.
///
/// Shapes, with `n` the layer's input width, `m` its output width and `b` the
/// batch size:
///
/// | field          | shape   |
/// |----------------|---------|
/// | `weights`      | `m x n` |
/// | `biases`       | `m x b` (every column identical) |
/// | `output`       | `m x b` (post-activation) |
/// | `errors`       | `b x m` |
/// | `deltas`       | `b x m` |
/// | `grad_weights` | `m x n` |
/// | `grad_biases`  | `m x b` |
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weights: Matrix,
    pub biases: Matrix,
    pub grad_weights: Matrix,
    pub grad_biases: Matrix,
    output: Matrix,
    errors: Matrix,
    deltas: Matrix,
    activation: Activation,
}

impl DenseLayer {
    /// Create a layer with Glorot-uniform weights and zeroed everything else.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        batch_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = glorot_limit(input_size, output_size);
        let weights = Array2::random_using(
            (output_size, input_size),
            Uniform::new_inclusive(-limit, limit),
            rng,
        );
        DenseLayer {
            weights: Matrix::from_array(weights),
            biases: Matrix::new(output_size, batch_size),
            grad_weights: Matrix::new(output_size, input_size),
            grad_biases: Matrix::new(output_size, batch_size),
            output: Matrix::new(output_size, batch_size),
            errors: Matrix::new(batch_size, output_size),
            deltas: Matrix::new(batch_size, output_size),
            activation,
        }
    }

    /// Redraw Glorot-uniform weights and zero the biases and all per-batch
    /// state, keeping the existing storage.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let limit = glorot_limit(self.input_size(), self.output_size());
        self.weights.randomize(-limit, limit, rng);
        self.biases.clear();
        self.grad_weights.clear();
        self.grad_biases.clear();
        self.output.clear();
        self.errors.clear();
        self.deltas.clear();
    }

    pub fn input_size(&self) -> usize {
        self.weights.columns()
    }

    pub fn output_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn batch_size(&self) -> usize {
        self.output.columns()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn output(&self) -> &Matrix {
        &self.output
    }

    pub fn errors(&self) -> &Matrix {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut Matrix {
        &mut self.errors
    }

    pub fn deltas(&self) -> &Matrix {
        &self.deltas
    }

    /// `output = activation(weights · input + biases)` for an `n x b` input.
    pub fn forward(&mut self, input: &Matrix) {
        Matrix::dot_into(&self.weights, input, &mut self.output);
        self.output += &self.biases;
        self.activation.apply_batch(&mut self.output);
    }

    /// `deltas = errors ⊙ activation'(outputᵗ)`. Requires `errors` to hold
    /// this layer's error for the current batch.
    pub fn compute_deltas(&mut self) {
        Matrix::transpose_into(&self.output, &mut self.deltas);
        self.activation.derivative_batch(&mut self.deltas);
        self.deltas.odot(&self.errors);
    }

    /// Push this layer's deltas through its weights: `upstream = deltas · weights`,
    /// giving the `b x n` error at this layer's input.
    pub fn propagate_errors(&self, upstream: &mut Matrix) {
        Matrix::dot_into(&self.deltas, &self.weights, upstream);
    }

    /// Batch-averaged gradients from this layer's `n x b` input and its deltas.
    pub fn compute_gradients(&mut self, input: &Matrix) {
        let batch_size = self.batch_size() as f64;
        Matrix::dot_transpose_into(input, &self.deltas, &mut self.grad_weights);
        self.grad_weights /= batch_size;
        Matrix::sum_rows_transpose_into(&self.deltas, &mut self.grad_biases);
        self.grad_biases /= batch_size;
    }

    /// Plain gradient descent step. The gradients are scaled in place and are
    /// no longer valid afterwards.
    pub fn sgd(&mut self, learning_rate: f64, clipper: &GradientClipper) {
        clipper.clip(&mut self.grad_weights);
        clipper.clip(&mut self.grad_biases);

        self.grad_weights *= learning_rate;
        self.weights -= &self.grad_weights;

        self.grad_biases *= learning_rate;
        self.biases -= &self.grad_biases;
    }

    /// Copy every matrix from a layer of identical shape.
    pub fn copy_from(&mut self, src: &DenseLayer) {
        self.weights.copy_from(&src.weights);
        self.biases.copy_from(&src.biases);
        self.grad_weights.copy_from(&src.grad_weights);
        self.grad_biases.copy_from(&src.grad_biases);
        self.output.copy_from(&src.output);
        self.errors.copy_from(&src.errors);
        self.deltas.copy_from(&src.deltas);
    }
}

/// The only layer kind a network is built from.
pub type Layer = DenseLayer;

fn glorot_limit(fan_in: usize, fan_out: usize) -> f64 {
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_layer_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = DenseLayer::new(3, 5, 4, Activation::Relu, &mut rng);

        assert_eq!(layer.weights.shape(), (5, 3));
        assert_eq!(layer.biases.shape(), (5, 4));
        assert_eq!(layer.output().shape(), (5, 4));
        assert_eq!(layer.errors().shape(), (4, 5));
        assert_eq!(layer.deltas().shape(), (4, 5));
        assert_eq!(layer.grad_weights.shape(), (5, 3));
        assert_eq!(layer.grad_biases.shape(), (5, 4));
    }

    #[test]
    fn test_glorot_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut layer = DenseLayer::new(10, 6, 2, Activation::Tanh, &mut rng);
        let limit = (6.0f64 / 16.0).sqrt();
        assert!(layer.weights.as_array().iter().all(|w| w.abs() <= limit));

        layer.initialize(&mut rng);
        assert!(layer.weights.as_array().iter().all(|w| w.abs() <= limit));
        assert!(layer.weights.as_array().iter().any(|&w| w != 0.0));
        assert!(layer.biases.as_array().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_forward_adds_broadcast_bias() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = DenseLayer::new(2, 1, 3, Activation::Linear, &mut rng);
        layer.weights = Matrix::from_shape_vec(1, 2, vec![1.0, -1.0]).unwrap();
        layer.biases.fill(0.5);

        let input = Matrix::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 0.0, 1.0, 5.0]).unwrap();
        layer.forward(&input);

        assert_eq!(layer.output().get(0, 0), 1.5);
        assert_eq!(layer.output().get(0, 1), 1.5);
        assert_eq!(layer.output().get(0, 2), -1.5);
    }
}
