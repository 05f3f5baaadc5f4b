use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::activations::Activation;
use crate::error::{PallasError, Result};
use crate::layers::Layer;
use crate::loss::Loss;
use crate::matrix::Matrix;
use crate::optimizer::GradientClipper;

/// Architecture of a strictly layered, fully connected network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    pub batch_size: usize,
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.output_size == 0 {
            return Err(PallasError::invalid_parameter(
                "input_size/output_size",
                "must be positive",
            ));
        }
        if self.hidden_sizes.iter().any(|&s| s == 0) {
            return Err(PallasError::invalid_parameter(
                "hidden_sizes",
                "every hidden layer needs at least one unit",
            ));
        }
        if self.batch_size == 0 {
            return Err(PallasError::invalid_parameter("batch_size", "must be positive"));
        }
        Ok(())
    }
}

/// A multilayer perceptron with a fixed batch size.
///
/// Every matrix the network will ever touch is allocated in [`NeuralNetwork::new`]:
/// the per-layer storage described on [`Layer`], an `input` staging matrix
/// (`inputs x batch`), the `input_errors` matrix (`batch x inputs`) exposing
/// the error back-propagated to the input layer, and the batch-major `output`
/// (`batch x outputs`). The input layer is not a [`Layer`]; it exists only as
/// the staging matrix.
///
/// Outputs of a [`feedforward`](NeuralNetwork::feedforward) stay valid until the
/// next `feedforward` or [`backpropagate`](NeuralNetwork::backpropagate), which
/// relies on them.
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    layers: Vec<Layer>,
    batch_size: usize,
    input: Matrix,
    input_errors: Matrix,
    output: Matrix,
}

/// Weights and biases read from a weight stream and already checked against
/// the network that read them, waiting to be applied.
#[derive(Clone, Debug)]
pub struct WeightSnapshot {
    records: Vec<(Matrix, Matrix)>,
}

impl NeuralNetwork {
    /// Create a network with `hidden_sizes.len()` hidden layers, Glorot-uniform
    /// weights and zeroed biases.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        hidden_sizes: &[usize],
        hidden_activation: Activation,
        output_activation: Activation,
        batch_size: usize,
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden_sizes.len() + 1);
        let mut layer_input = input_size;
        for &size in hidden_sizes {
            layers.push(Layer::new(layer_input, size, batch_size, hidden_activation, rng));
            layer_input = size;
        }
        layers.push(Layer::new(layer_input, output_size, batch_size, output_activation, rng));

        NeuralNetwork {
            layers,
            batch_size,
            input: Matrix::new(input_size, batch_size),
            input_errors: Matrix::new(batch_size, input_size),
            output: Matrix::new(batch_size, output_size),
        }
    }

    pub fn from_config<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.input_size,
            config.output_size,
            &config.hidden_sizes,
            config.hidden_activation,
            config.output_activation,
            config.batch_size,
            rng,
        ))
    }

    /// Redraw all weights and clear every other matrix.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.initialize(rng);
        }
        self.input.clear();
        self.input_errors.clear();
        self.output.clear();
    }

    /// Copy all content of `src` into this network without touching its
    /// storage layout. Both networks must have the same architecture.
    pub fn copy_from(&mut self, src: &NeuralNetwork) {
        debug_assert_eq!(self.layers.len(), src.layers.len());
        for (dst, src) in self.layers.iter_mut().zip(&src.layers) {
            dst.copy_from(src);
        }
        self.input.copy_from(&src.input);
        self.input_errors.copy_from(&src.input_errors);
        self.output.copy_from(&src.output);
    }

    pub fn input_size(&self) -> usize {
        self.input.rows()
    }

    pub fn output_size(&self) -> usize {
        self.output.columns()
    }

    /// Number of hidden layers.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// The batch-major output of the last feedforward.
    pub fn output(&self) -> &Matrix {
        &self.output
    }

    /// The `batch x inputs` error at the input layer after the last
    /// back-propagation. This is the boundary error an upstream network
    /// consumes to continue the chain rule.
    pub fn input_errors(&self) -> &Matrix {
        &self.input_errors
    }

    /// Evaluate a `batch x inputs` matrix and return the `batch x outputs`
    /// result, which is owned by the network.
    pub fn feedforward(&mut self, x: &Matrix) -> &Matrix {
        debug_assert_eq!(x.shape(), (self.batch_size, self.input_size()));
        Matrix::transpose_into(x, &mut self.input);

        for i in 0..self.layers.len() {
            let (previous, rest) = self.layers.split_at_mut(i);
            let input = previous.last().map_or(&self.input, |l| l.output());
            rest[0].forward(input);
        }

        if let Some(last) = self.layers.last() {
            Matrix::transpose_into(last.output(), &mut self.output);
        }
        &self.output
    }

    /// Back-propagate from the last feedforward against `y` and fill every
    /// layer's gradients. With [`Loss::None`] `y` is taken as the error at the
    /// output layer. Returns the loss reported by `loss`.
    pub fn backpropagate(&mut self, y: &Matrix, loss: Loss) -> f64 {
        debug_assert_eq!(y.shape(), self.output.shape());
        let depth = self.depth();
        let value = loss.compute(&self.output, y, self.layers[depth].errors_mut());

        for i in (0..=depth).rev() {
            let (lower, upper) = self.layers.split_at_mut(i);
            let layer = &mut upper[0];
            layer.compute_deltas();
            match lower.last_mut() {
                Some(previous) => layer.propagate_errors(previous.errors_mut()),
                None => layer.propagate_errors(&mut self.input_errors),
            }
        }

        for i in 0..self.layers.len() {
            let (previous, rest) = self.layers.split_at_mut(i);
            let input = previous.last().map_or(&self.input, |l| l.output());
            rest[0].compute_gradients(input);
        }

        value
    }

    /// Gradient descent with learning rate `lr`.
    pub fn sgd(&mut self, lr: f64) {
        for layer in &mut self.layers {
            layer.sgd(lr, &GradientClipper::None);
        }
    }

    /// Gradient descent after rescaling each gradient matrix to at most
    /// `clip_norm` in L2 norm.
    pub fn sgd_clip(&mut self, lr: f64, clip_norm: f64) {
        let clipper = GradientClipper::ClipByNorm { max_norm: clip_norm };
        for layer in &mut self.layers {
            layer.sgd(lr, &clipper);
        }
    }

    /// Write weights then biases of every layer, first hidden layer first.
    pub fn write_weights<W: Write>(&self, writer: &mut W) -> Result<()> {
        for layer in &self.layers {
            layer.weights.write(writer)?;
            layer.biases.write(writer)?;
        }
        Ok(())
    }

    /// Read one weight record per layer and check each against this network's
    /// shapes without modifying the network.
    pub fn read_weight_snapshot<R: Read>(&self, reader: &mut R) -> Result<WeightSnapshot> {
        let mut records = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate() {
            let weights = read_record(reader, i, "weights", &layer.weights)?;
            let biases = read_record(reader, i, "biases", &layer.biases)?;
            records.push((weights, biases));
        }
        Ok(WeightSnapshot { records })
    }

    /// Overwrite weights and biases from a snapshot taken by
    /// [`read_weight_snapshot`](NeuralNetwork::read_weight_snapshot).
    pub fn apply_weight_snapshot(&mut self, snapshot: &WeightSnapshot) {
        debug_assert_eq!(snapshot.records.len(), self.layers.len());
        for (layer, (weights, biases)) in self.layers.iter_mut().zip(&snapshot.records) {
            layer.weights.copy_from(weights);
            layer.biases.copy_from(biases);
        }
    }

    /// Read weights for every layer. Either every layer is updated or, on
    /// any failure, none is.
    pub fn read_weights<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let snapshot = self.read_weight_snapshot(reader)?;
        self.apply_weight_snapshot(&snapshot);
        Ok(())
    }

    pub fn save_weights<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_weights(&mut writer)?;
        writer.flush()?;
        info!("saved network weights to {}", path.display());
        Ok(())
    }

    pub fn load_weights<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        self.read_weights(&mut reader)?;
        info!("loaded network weights from {}", path.display());
        Ok(())
    }
}

/// Read one record whose header must match `expected` before its body is
/// touched.
fn read_record<R: Read>(reader: &mut R, layer: usize, what: &str, expected: &Matrix) -> Result<Matrix> {
    let (rows, columns) = Matrix::read_header(reader)?;
    if expected.shape() != (rows, columns) {
        debug!(
            "layer {} {} shape mismatch: {:?} vs {:?}",
            layer,
            what,
            expected.shape(),
            (rows, columns)
        );
        return Err(PallasError::dimension_mismatch(
            format!("layer {} {} {}x{}", layer, what, expected.rows(), expected.columns()),
            format!("{}x{}", rows, columns),
        ));
    }
    Matrix::read_values(reader, rows, columns)
}
