//! # Pallas - Fixed-Shape Neural Networks and DDPG
//!
//! Pallas trains small, strictly layered, fully connected networks and uses
//! them as function approximators in a continuous-action actor-critic agent.
//! Every matrix is allocated when a network, optimizer or agent is
//! constructed. Forward passes, back-propagation, optimizer steps, acting and
//! training never allocate, which makes the inner loops usable in real-time
//! settings.
//!
//! ## Key Features
//!
//! - **Matrix engine**: fixed-shape `f64` matrices with in-place arithmetic
//! - **Networks**: batched feedforward and back-propagation with an injectable
//!   boundary error at the output, exposing the error at the input layer
//! - **Optimizers**: Adam and plain (optionally clipped) gradient descent
//! - **DDPG**: replay memory, critic-to-actor gradient coupling, hard target
//!   synchronization, policy persistence
//!
//! ## Quick Start
//!
//! ```rust
//! use pallas::activations::Activation;
//! use pallas::loss::Loss;
//! use pallas::matrix::Matrix;
//! use pallas::network::NeuralNetwork;
//! use pallas::optimizer::{Adam, Optimizer};
//! use pallas::random;
//!
//! let mut rng = random::seeded(Some(7));
//! let mut network = NeuralNetwork::new(2, 1, &[64], Activation::Relu, Activation::Linear, 32, &mut rng);
//! let mut adam = Adam::new(&network);
//!
//! let mut x = Matrix::new(32, 2);
//! let mut y = Matrix::new(32, 1);
//! x.randomize(-1.0, 1.0, &mut rng);
//! for row in 0..32 {
//!     let (x1, x2) = (x.get(row, 0), x.get(row, 1));
//!     y.set(row, 0, x1 * x1 - x2 * x2);
//! }
//!
//! network.feedforward(&x);
//! let loss = network.backpropagate(&y, Loss::Mse);
//! adam.step(&mut network);
//! assert!(loss.is_finite());
//! ```
//!
//! ## Module Organization
//!
//! - [`matrix`] - Dense matrix engine and its binary format
//! - [`activations`] - Activation functions with output-expressed derivatives
//! - [`loss`] - Loss functions, including the pass-through used for boundary errors
//! - [`layers`] - Fully connected layer storage
//! - [`network`] - Layered network: forward, back-propagation, weight files
//! - [`optimizer`] - Adam and gradient descent
//! - [`replay_buffer`] - Fixed-capacity transition memory
//! - [`algorithms`] - The DDPG agent
//! - [`random`] - Seedable random source
//! - [`error`] - Error types and result handling

pub mod activations;
pub mod algorithms;
pub mod error;
pub mod layers;
pub mod loss;
pub mod matrix;
pub mod network;
pub mod optimizer;
pub mod random;
pub mod replay_buffer;

#[cfg(test)]
mod tests;
