//! # Reinforcement Learning Algorithms
//!
//! - **DDPG (Deep Deterministic Policy Gradient)**: an off-policy actor-critic
//!   method for continuous actions. The actor is trained by back-propagating
//!   the critic's input-layer error, restricted to the action inputs, through
//!   the actor. Target networks are hard copies synchronized by the caller.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pallas::algorithms::DdpgBuilder;
//!
//! let mut agent = DdpgBuilder::new(2, 1)
//!     .actor_layers(vec![128, 64])
//!     .critic_layers(vec![128, 64])
//!     .noise(vec![0.01])
//!     .memory_size(100_000)
//!     .batch_size(32)
//!     .build()
//!     .unwrap();
//!
//! agent.new_episode();
//! agent.observe(&[0.0], 0.0, &[0.1, 0.0], false);
//! let action = agent.action(&[0.1, 0.0]).to_vec();
//! agent.observe(&action, -1.0, &[0.2, 0.1], false);
//! agent.train(0.99);
//! ```

pub mod ddpg;

pub use ddpg::{DdpgAgent, DdpgBuilder, DdpgConfig, TrainStats};
