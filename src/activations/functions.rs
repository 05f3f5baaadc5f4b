use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;

/// An enumeration of the activation functions a layer can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Linear,
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    /// Resolve an integer activation code. Unknown codes fall back to linear.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Activation::Sigmoid,
            2 => Activation::Tanh,
            3 => Activation::Relu,
            _ => Activation::Linear,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Activation::Linear => 0,
            Activation::Sigmoid => 1,
            Activation::Tanh => 2,
            Activation::Relu => 3,
        }
    }

    /// Apply the activation to a single pre-activation value.
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Sigmoid => {
                if x >= 0.0 {
                    1.0 / (1.0 + (-x).exp())
                } else {
                    let e = x.exp();
                    e / (1.0 + e)
                }
            }
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
        }
    }

    /// Derivative of the activation evaluated from its output `y`.
    #[inline]
    pub fn derivative(&self, y: f64) -> f64 {
        match self {
            Activation::Linear => 1.0,
            Activation::Sigmoid => y * (1.0 - y),
            Activation::Tanh => 1.0 - y * y,
            Activation::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Apply the activation to every element of a batch in place.
    pub fn apply_batch(&self, matrix: &mut Matrix) {
        if *self == Activation::Linear {
            return;
        }
        let activation = *self;
        matrix.apply(|v| activation.apply(v));
    }

    /// Replace every output value in place with the derivative at that output.
    pub fn derivative_batch(&self, matrix: &mut Matrix) {
        let activation = *self;
        matrix.apply(|y| activation.derivative(y));
    }
}
