use crate::matrix::Matrix;

/// Gradient clipping applied per gradient matrix before a descent step
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum GradientClipper {
    /// Rescale a gradient matrix whose L2 norm exceeds `max_norm` so that its
    /// norm becomes exactly `max_norm`
    ClipByNorm { max_norm: f64 },

    /// No clipping
    #[default]
    None,
}

impl GradientClipper {
    pub fn from_option(max_norm: Option<f64>) -> Self {
        match max_norm {
            Some(max_norm) => GradientClipper::ClipByNorm { max_norm },
            None => GradientClipper::None,
        }
    }

    pub fn clip(&self, gradients: &mut Matrix) {
        match self {
            GradientClipper::ClipByNorm { max_norm } => {
                let norm = gradients.norm();
                if norm > *max_norm {
                    *gradients *= max_norm / norm;
                }
            }
            GradientClipper::None => {}
        }
    }
}
