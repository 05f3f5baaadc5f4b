//! Parameter update rules applied after [`NeuralNetwork::backpropagate`]
//! has filled every layer's gradient matrices.
//!
//! [`Adam`] keeps first and second moment matrices shaped exactly like the
//! network it was created from, so one `Adam` instance belongs to one network.

pub mod gradient_clipper;

use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;
use crate::network::NeuralNetwork;

pub use gradient_clipper::GradientClipper;

pub trait Optimizer {
    /// Apply one update to `network` from its current gradients.
    fn step(&mut self, network: &mut NeuralNetwork);
}

/// Plain gradient descent, optionally clipping each gradient matrix first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
    pub clipper: GradientClipper,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Sgd {
            learning_rate,
            clipper: GradientClipper::None,
        }
    }

    pub fn with_clip_norm(learning_rate: f64, max_norm: f64) -> Self {
        Sgd {
            learning_rate,
            clipper: GradientClipper::ClipByNorm { max_norm },
        }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, network: &mut NeuralNetwork) {
        for layer in network.layers_mut() {
            layer.sgd(self.learning_rate, &self.clipper);
        }
    }
}

/// Adam hyperparameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub alpha: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig {
            alpha: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Adam {
    pub alpha: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    beta1_t: f64,
    beta2_t: f64,
    t: usize,
    m_weights: Vec<Matrix>,
    v_weights: Vec<Matrix>,
    m_biases: Vec<Matrix>,
    v_biases: Vec<Matrix>,
}

impl Adam {
    /// Create an optimizer for `network` with the default hyperparameters.
    pub fn new(network: &NeuralNetwork) -> Self {
        Self::with_config(network, AdamConfig::default())
    }

    pub fn with_config(network: &NeuralNetwork, config: AdamConfig) -> Self {
        let layers = network.layers();
        let zeros_like = |m: &Matrix| Matrix::new(m.rows(), m.columns());

        let mut adam = Adam {
            alpha: config.alpha,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            beta1_t: config.beta1,
            beta2_t: config.beta2,
            t: 0,
            m_weights: layers.iter().map(|l| zeros_like(&l.weights)).collect(),
            v_weights: layers.iter().map(|l| zeros_like(&l.weights)).collect(),
            m_biases: layers.iter().map(|l| zeros_like(&l.biases)).collect(),
            v_biases: layers.iter().map(|l| zeros_like(&l.biases)).collect(),
        };
        adam.reset();
        adam
    }

    /// Override the hyperparameters. Meant to be called before the first
    /// step; the running powers restart from the new decay rates.
    pub fn set(&mut self, alpha: f64, beta1: f64, beta2: f64, epsilon: f64) {
        self.alpha = alpha;
        self.beta1 = beta1;
        self.beta2 = beta2;
        self.epsilon = epsilon;
        self.beta1_t = beta1;
        self.beta2_t = beta2;
    }

    pub fn config(&self) -> AdamConfig {
        AdamConfig {
            alpha: self.alpha,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
        }
    }

    /// Zero the step counter and every moment matrix. The network's weights
    /// are left alone.
    pub fn reset(&mut self) {
        self.t = 0;
        self.beta1_t = self.beta1;
        self.beta2_t = self.beta2;
        for m in self
            .m_weights
            .iter_mut()
            .chain(self.v_weights.iter_mut())
            .chain(self.m_biases.iter_mut())
            .chain(self.v_biases.iter_mut())
        {
            m.clear();
        }
    }

    /// Number of steps taken since creation or the last reset.
    pub fn t(&self) -> usize {
        self.t
    }

    /// `(β1ᵗ, β2ᵗ)` for the next step.
    pub fn running_powers(&self) -> (f64, f64) {
        (self.beta1_t, self.beta2_t)
    }

    pub fn m_weights(&self) -> &[Matrix] {
        &self.m_weights
    }

    pub fn v_weights(&self) -> &[Matrix] {
        &self.v_weights
    }

    pub fn m_biases(&self) -> &[Matrix] {
        &self.m_biases
    }

    pub fn v_biases(&self) -> &[Matrix] {
        &self.v_biases
    }

    fn coefficients(&self) -> StepCoefficients {
        StepCoefficients {
            alpha: self.alpha,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            correction1: 1.0 - self.beta1_t,
            correction2: 1.0 - self.beta2_t,
        }
    }
}

#[derive(Clone, Copy)]
struct StepCoefficients {
    alpha: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    correction1: f64,
    correction2: f64,
}

impl StepCoefficients {
    fn apply(&self, params: &mut Matrix, grads: &Matrix, m: &mut Matrix, v: &mut Matrix) {
        let c = *self;
        ndarray::Zip::from(params.as_array_mut())
            .and(grads.as_array())
            .and(m.as_array_mut())
            .and(v.as_array_mut())
            .for_each(|p, &g, m, v| {
                *m = c.beta1 * *m + (1.0 - c.beta1) * g;
                *v = c.beta2 * *v + (1.0 - c.beta2) * g * g;
                let m_hat = *m / c.correction1;
                let v_hat = *v / c.correction2;
                *p -= c.alpha * (m_hat / (v_hat.sqrt() + c.epsilon));
            });
    }
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut NeuralNetwork) {
        debug_assert_eq!(network.layers().len(), self.m_weights.len());
        self.t += 1;
        let coefficients = self.coefficients();

        let moments = self
            .m_weights
            .iter_mut()
            .zip(self.v_weights.iter_mut())
            .zip(self.m_biases.iter_mut().zip(self.v_biases.iter_mut()));
        for (layer, ((mw, vw), (mb, vb))) in network.layers_mut().iter_mut().zip(moments) {
            coefficients.apply(&mut layer.weights, &layer.grad_weights, mw, vw);
            coefficients.apply(&mut layer.biases, &layer.grad_biases, mb, vb);
        }

        self.beta1_t *= self.beta1;
        self.beta2_t *= self.beta2;
    }
}
