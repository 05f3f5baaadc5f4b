//! Loss functions used by [`crate::network::NeuralNetwork::backpropagate`].
//!
//! A loss writes the output-layer error matrix from the network's prediction
//! and a target, and reports a scalar summary. [`Loss::None`] treats the
//! target itself as the already-computed error, which is how one network's
//! input-layer error is injected at the output of another.

pub mod functions;

pub use functions::Loss;
