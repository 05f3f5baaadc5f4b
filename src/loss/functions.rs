use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Loss {
    /// Pass-through: the supplied matrix is the error.
    #[default]
    None,
    /// Mean squared error.
    Mse,
}

impl Loss {
    /// Resolve an integer loss code. Unknown codes fall back to pass-through.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Loss::Mse,
            _ => Loss::None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Loss::None => 0,
            Loss::Mse => 1,
        }
    }

    /// Write the error for `prediction` against `target` into `error` and
    /// return the loss value.
    ///
    /// All three matrices are `batch x outputs`. For [`Loss::None`] the
    /// return value is the mean of the injected error, which callers
    /// generally ignore.
    pub fn compute(&self, prediction: &Matrix, target: &Matrix, error: &mut Matrix) -> f64 {
        match self {
            Loss::None => {
                error.copy_from(target);
                error.mean()
            }
            Loss::Mse => {
                Matrix::difference_into(prediction, target, error);
                let n = error.len() as f64;
                error.as_array().iter().map(|e| e * e).sum::<f64>() / n
            }
        }
    }
}
