use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::activations::Activation;
use crate::error::{PallasError, Result};
use crate::loss::Loss;
use crate::matrix::Matrix;
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, AdamConfig, Optimizer};
use crate::random;
use crate::replay_buffer::ReplayMemory;

/// Construction-time configuration of a [`DdpgAgent`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DdpgConfig {
    pub state_size: usize,
    pub action_size: usize,
    /// Hidden layer widths of the actor
    pub actor_layers: Vec<usize>,
    /// Hidden layer widths of the critic
    pub critic_layers: Vec<usize>,
    /// Half-width of the uniform exploration noise per action dimension.
    /// `None` disables noise.
    #[serde(default)]
    pub noise: Option<Vec<f64>>,
    /// Replay memory capacity in transitions
    pub memory_size: usize,
    pub batch_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub actor_adam: AdamConfig,
    #[serde(default)]
    pub critic_adam: AdamConfig,
}

impl DdpgConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: DdpgConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 || self.action_size == 0 {
            return Err(PallasError::invalid_parameter(
                "state_size/action_size",
                "must be positive",
            ));
        }
        if self.actor_layers.iter().chain(&self.critic_layers).any(|&s| s == 0) {
            return Err(PallasError::invalid_parameter(
                "actor_layers/critic_layers",
                "every hidden layer needs at least one unit",
            ));
        }
        if self.batch_size == 0 {
            return Err(PallasError::invalid_parameter("batch_size", "must be positive"));
        }
        if self.memory_size == 0 {
            return Err(PallasError::invalid_parameter("memory_size", "must be positive"));
        }
        if let Some(noise) = &self.noise {
            if noise.len() != self.action_size {
                return Err(PallasError::InvalidParameter {
                    name: "noise".to_string(),
                    reason: format!(
                        "expected {} entries, one per action dimension, got {}",
                        self.action_size,
                        noise.len()
                    ),
                });
            }
            if noise.iter().any(|n| !n.is_finite() || *n < 0.0) {
                return Err(PallasError::invalid_parameter(
                    "noise",
                    "half-widths must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Summary of one [`DdpgAgent::train`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainStats {
    /// Mean critic estimate of the actor's proposed actions before the update
    pub mean_q: f64,
    /// Mean absolute temporal-difference error fed to the critic
    pub mean_abs_td_error: f64,
}

/// Deep Deterministic Policy Gradient agent.
///
/// The actor maps a state to an action in `[-1, 1]` per dimension (tanh
/// output). The critic maps `[action | state]` to a scalar value (linear
/// output). Both use ReLU hidden layers. All batch staging matrices and the
/// replay memory are allocated here; acting and training allocate nothing.
#[derive(Clone, Debug)]
pub struct DdpgAgent {
    state_size: usize,
    action_size: usize,
    batch_size: usize,
    actor: NeuralNetwork,
    critic: NeuralNetwork,
    actor_target: NeuralNetwork,
    critic_target: NeuralNetwork,
    actor_adam: Adam,
    critic_adam: Adam,
    actor_input: Matrix,
    critic_input: Matrix,
    actor_errors: Matrix,
    critic_errors: Matrix,
    batch_indices: Vec<usize>,
    memory: ReplayMemory,
    last_state: Vec<f64>,
    last_state_valid: bool,
    noise: Option<Vec<f64>>,
    action: Vec<f64>,
    rng: StdRng,
}

impl DdpgAgent {
    /// Create an agent, seeding its random source from `config.seed`.
    pub fn new(config: DdpgConfig) -> Result<Self> {
        let rng = random::seeded(config.seed);
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: DdpgConfig, mut rng: StdRng) -> Result<Self> {
        if let Err(err) = config.validate() {
            warn!("rejected ddpg configuration: {}", err);
            return Err(err);
        }
        let (s, a, batch) = (config.state_size, config.action_size, config.batch_size);

        let actor = NeuralNetwork::new(
            s,
            a,
            &config.actor_layers,
            Activation::Relu,
            Activation::Tanh,
            batch,
            &mut rng,
        );
        let critic = NeuralNetwork::new(
            a + s,
            1,
            &config.critic_layers,
            Activation::Relu,
            Activation::Linear,
            batch,
            &mut rng,
        );
        let actor_target = actor.clone();
        let critic_target = critic.clone();
        let actor_adam = Adam::with_config(&actor, config.actor_adam);
        let critic_adam = Adam::with_config(&critic, config.critic_adam);

        Ok(DdpgAgent {
            state_size: s,
            action_size: a,
            batch_size: batch,
            actor,
            critic,
            actor_target,
            critic_target,
            actor_adam,
            critic_adam,
            actor_input: Matrix::new(batch, s),
            critic_input: Matrix::new(batch, a + s),
            actor_errors: Matrix::new(batch, a),
            critic_errors: Matrix::new(batch, 1),
            batch_indices: vec![0; batch],
            memory: ReplayMemory::new(config.memory_size, s, a),
            last_state: vec![0.0; s],
            last_state_valid: false,
            noise: config.noise,
            action: vec![0.0; a],
            rng,
        })
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn actor(&self) -> &NeuralNetwork {
        &self.actor
    }

    pub fn critic(&self) -> &NeuralNetwork {
        &self.critic
    }

    pub fn actor_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.actor
    }

    pub fn critic_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.critic
    }

    pub fn actor_target(&self) -> &NeuralNetwork {
        &self.actor_target
    }

    pub fn critic_target(&self) -> &NeuralNetwork {
        &self.critic_target
    }

    pub fn actor_optimizer(&self) -> &Adam {
        &self.actor_adam
    }

    pub fn critic_optimizer(&self) -> &Adam {
        &self.critic_adam
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// The state the next observed transition will start from, if any.
    pub fn last_state(&self) -> Option<&[f64]> {
        self.last_state_valid.then_some(self.last_state.as_slice())
    }

    /// Forget the staged state so the next [`observe`](DdpgAgent::observe)
    /// starts a new chain of transitions.
    pub fn new_episode(&mut self) {
        self.last_state_valid = false;
    }

    /// Record the outcome of taking `action`. The first call of an episode only
    /// stages `next_state`; later calls store
    /// `[last_state, action, reward, next_state, terminal]`.
    pub fn observe(&mut self, action: &[f64], reward: f64, next_state: &[f64], terminal: bool) {
        debug_assert_eq!(action.len(), self.action_size);
        debug_assert_eq!(next_state.len(), self.state_size);

        if self.last_state_valid {
            self.memory
                .push(&self.last_state, action, reward, next_state, terminal);
        }
        self.last_state.copy_from_slice(next_state);
        self.last_state_valid = true;
    }

    /// Propose an action for `state`, with exploration noise if configured,
    /// clipped to `[-1, 1]`.
    pub fn action(&mut self, state: &[f64]) -> &[f64] {
        debug_assert_eq!(state.len(), self.state_size);

        // Only row 0 matters; the rest pads the fixed batch.
        self.actor_input.clear();
        self.actor_input.set_row_segment(0, 0, state);
        let output = self.actor.feedforward(&self.actor_input);

        for (i, value) in self.action.iter_mut().enumerate() {
            *value = output.get(0, i);
        }
        if let Some(noise) = &self.noise {
            for (value, &width) in self.action.iter_mut().zip(noise) {
                *value += self.rng.gen_range(-width..=width);
            }
        }
        for value in self.action.iter_mut() {
            *value = value.clamp(-1.0, 1.0);
        }
        &self.action
    }

    /// One actor step and one critic step on a batch sampled with
    /// replacement from the replay memory. Does nothing and returns `None`
    /// while fewer than one batch of transitions is stored.
    pub fn train(&mut self, gamma: f64) -> Option<TrainStats> {
        if self.memory.len() < self.batch_size {
            return None;
        }
        self.memory.sample_indices(&mut self.rng, &mut self.batch_indices);

        let mean_q = self.train_actor();
        let mean_abs_td_error = self.train_critic(gamma);

        debug!(
            "ddpg train: mean_q={:.6} mean_abs_td_error={:.6} actor_t={} critic_t={}",
            mean_q,
            mean_abs_td_error,
            self.actor_adam.t(),
            self.critic_adam.t()
        );
        Some(TrainStats {
            mean_q,
            mean_abs_td_error,
        })
    }

    /// Ascend the critic's estimate of `critic(actor(s), s)` by descending its
    /// negation: a constant `-1` error at the critic output is back-propagated
    /// through the critic, and the action slice of the critic's input error is
    /// fed into the actor as its output error. Only the actor is updated.
    fn train_actor(&mut self) -> f64 {
        let (s, a) = (self.state_size, self.action_size);
        let memory = self.memory.matrix();

        for (row, &idx) in self.batch_indices.iter().enumerate() {
            self.actor_input.copy_row_segment(row, 0, memory, idx, 0, s);
        }
        let proposed = self.actor.feedforward(&self.actor_input);

        for (row, &idx) in self.batch_indices.iter().enumerate() {
            self.critic_input.copy_row_segment(row, 0, proposed, row, 0, a);
            self.critic_input.copy_row_segment(row, a, memory, idx, 0, s);
        }
        let mean_q = self.critic.feedforward(&self.critic_input).mean();

        self.critic_errors.fill(-1.0);
        self.critic.backpropagate(&self.critic_errors, Loss::None);

        let boundary = self.critic.input_errors();
        for row in 0..self.batch_size {
            self.actor_errors.copy_row_segment(row, 0, boundary, row, 0, a);
        }
        self.actor.backpropagate(&self.actor_errors, Loss::None);
        self.actor_adam.step(&mut self.actor);

        mean_q
    }

    /// Regress the critic towards `reward + gamma * critic_target(actor_target(s'), s')`.
    /// Terminal transitions use the critic's own prediction as target.
    fn train_critic(&mut self, gamma: f64) -> f64 {
        let (s, a) = (self.state_size, self.action_size);
        let memory = self.memory.matrix();
        let action_offset = self.memory.action_offset();
        let next_offset = self.memory.next_state_offset();

        for (row, &idx) in self.batch_indices.iter().enumerate() {
            self.critic_input.copy_row_segment(row, 0, memory, idx, action_offset, a);
            self.critic_input.copy_row_segment(row, a, memory, idx, 0, s);
        }
        self.critic.feedforward(&self.critic_input);

        for (row, &idx) in self.batch_indices.iter().enumerate() {
            self.actor_input.copy_row_segment(row, 0, memory, idx, next_offset, s);
        }
        let target_actions = self.actor_target.feedforward(&self.actor_input);

        for (row, &idx) in self.batch_indices.iter().enumerate() {
            self.critic_input.copy_row_segment(row, 0, target_actions, row, 0, a);
            self.critic_input.copy_row_segment(row, a, memory, idx, next_offset, s);
        }
        let target_values = self.critic_target.feedforward(&self.critic_input);

        let current = self.critic.output();
        let mut td_sum = 0.0;
        for (row, &idx) in self.batch_indices.iter().enumerate() {
            let q = current.get(row, 0);
            let target = if self.memory.terminal(idx) {
                q
            } else {
                self.memory.reward(idx) + gamma * target_values.get(row, 0)
            };
            let error = q - target;
            self.critic_errors.set(row, 0, error);
            td_sum += error.abs();
        }

        self.critic.backpropagate(&self.critic_errors, Loss::None);
        self.critic_adam.step(&mut self.critic);

        td_sum / self.batch_size as f64
    }

    /// Hard copy of the actor into the target actor and the critic into the
    /// target critic.
    pub fn update_target_networks(&mut self) {
        self.actor_target.copy_from(&self.actor);
        self.critic_target.copy_from(&self.critic);
        debug!("ddpg target networks synchronized");
    }

    /// Write the actor's weights followed by the critic's. Optimizer state and
    /// replay memory are not saved.
    pub fn save_policy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.actor.write_weights(&mut writer)?;
        self.critic.write_weights(&mut writer)?;
        writer.flush()?;
        info!("saved ddpg policy to {}", path.display());
        Ok(())
    }

    /// Restore actor and critic weights written by
    /// [`save_policy`](DdpgAgent::save_policy). Nothing is changed unless the
    /// whole file is valid for this agent's architecture. Target networks are
    /// left as they are until the next
    /// [`update_target_networks`](DdpgAgent::update_target_networks).
    pub fn load_policy<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let result = File::open(path).map_err(PallasError::from).and_then(|file| {
            let mut reader = BufReader::new(file);
            let actor = self.actor.read_weight_snapshot(&mut reader)?;
            let critic = self.critic.read_weight_snapshot(&mut reader)?;
            Ok((actor, critic))
        });

        match result {
            Ok((actor, critic)) => {
                self.actor.apply_weight_snapshot(&actor);
                self.critic.apply_weight_snapshot(&critic);
                info!("loaded ddpg policy from {}", path.display());
                Ok(())
            }
            Err(err) => {
                warn!("could not load ddpg policy from {}: {}", path.display(), err);
                Err(err)
            }
        }
    }
}

/// Builder for [`DdpgAgent`]
pub struct DdpgBuilder {
    config: DdpgConfig,
}

impl DdpgBuilder {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        DdpgBuilder {
            config: DdpgConfig {
                state_size,
                action_size,
                actor_layers: vec![64, 64],
                critic_layers: vec![64, 64],
                noise: None,
                memory_size: 100_000,
                batch_size: 32,
                seed: None,
                actor_adam: AdamConfig::default(),
                critic_adam: AdamConfig::default(),
            },
        }
    }

    pub fn actor_layers(mut self, layers: Vec<usize>) -> Self {
        self.config.actor_layers = layers;
        self
    }

    pub fn critic_layers(mut self, layers: Vec<usize>) -> Self {
        self.config.critic_layers = layers;
        self
    }

    pub fn noise(mut self, noise: Vec<f64>) -> Self {
        self.config.noise = Some(noise);
        self
    }

    pub fn without_noise(mut self) -> Self {
        self.config.noise = None;
        self
    }

    pub fn memory_size(mut self, memory_size: usize) -> Self {
        self.config.memory_size = memory_size;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn actor_adam(mut self, adam: AdamConfig) -> Self {
        self.config.actor_adam = adam;
        self
    }

    pub fn critic_adam(mut self, adam: AdamConfig) -> Self {
        self.config.critic_adam = adam;
        self
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    pub fn build(self) -> Result<DdpgAgent> {
        DdpgAgent::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn coupled_agent() -> DdpgAgent {
        let mut agent = DdpgBuilder::new(2, 1)
            .actor_layers(vec![6])
            .critic_layers(vec![6])
            .memory_size(8)
            .batch_size(4)
            .seed(21)
            .build()
            .unwrap();
        let transitions = [
            ([0.3, -0.2], 0.4, 1.0, [0.1, 0.5]),
            ([-0.7, 0.1], -0.6, -0.5, [0.2, -0.3]),
            ([0.5, 0.9], 0.1, 0.25, [-0.4, 0.8]),
            ([-0.1, -0.8], -0.2, 2.0, [0.6, 0.0]),
        ];
        for (state, action, reward, next_state) in &transitions {
            agent.memory.push(state, &[*action], *reward, next_state, false);
        }
        agent.batch_indices.copy_from_slice(&[0, 1, 2, 3]);
        agent
    }

    /// `[action | state]` rows for the critic, with actions from `actions`.
    fn critic_batch(actions: &Matrix, states: &Matrix) -> Matrix {
        let mut input = Matrix::new(states.rows(), 3);
        for row in 0..states.rows() {
            input.copy_row_segment(row, 0, actions, row, 0, 1);
            input.copy_row_segment(row, 1, states, row, 0, 2);
        }
        input
    }

    fn batch_states(agent: &DdpgAgent, next: bool) -> Matrix {
        let mut states = Matrix::new(4, 2);
        for (row, &idx) in agent.batch_indices.iter().enumerate() {
            let state = if next {
                agent.memory.next_state(idx)
            } else {
                agent.memory.state(idx)
            };
            states.set_row_segment(row, 0, state.as_slice().unwrap());
        }
        states
    }

    fn negated_mean_q(actor: &mut NeuralNetwork, critic: &mut NeuralNetwork, states: &Matrix) -> f64 {
        let actions = actor.feedforward(states).clone();
        -critic.feedforward(&critic_batch(&actions, states)).mean()
    }

    #[test]
    fn test_actor_gradient_matches_finite_differences() {
        let mut agent = coupled_agent();
        let states = batch_states(&agent, false);
        let mut actor = agent.actor.clone();
        let mut critic = agent.critic.clone();

        agent.train_actor();

        let h = 1e-5;
        for i in 0..actor.layers().len() {
            let (rows, columns) = actor.layers()[i].weights.shape();
            for row in 0..rows {
                for column in 0..columns {
                    let w = actor.layers()[i].weights.get(row, column);
                    actor.layers_mut()[i].weights.set(row, column, w + h);
                    let plus = negated_mean_q(&mut actor, &mut critic, &states);
                    actor.layers_mut()[i].weights.set(row, column, w - h);
                    let minus = negated_mean_q(&mut actor, &mut critic, &states);
                    actor.layers_mut()[i].weights.set(row, column, w);

                    let numeric = (plus - minus) / (2.0 * h);
                    let analytic = agent.actor.layers()[i].grad_weights.get(row, column);
                    assert!(
                        (analytic - numeric).abs() <= 1e-6 + 1e-4 * numeric.abs(),
                        "actor w[{}]({}, {}): {} vs {}",
                        i,
                        row,
                        column,
                        analytic,
                        numeric
                    );
                }
            }
        }
    }

    #[test]
    fn test_critic_error_is_prediction_minus_bootstrap_target() {
        let mut agent = coupled_agent();
        let mut rng = StdRng::seed_from_u64(99);
        agent.actor_target.initialize(&mut rng);
        agent.critic_target.initialize(&mut rng);

        let gamma = 0.9;
        let states = batch_states(&agent, false);
        let next_states = batch_states(&agent, true);
        let mut actions = Matrix::new(4, 1);
        for (row, &idx) in agent.batch_indices.iter().enumerate() {
            actions.set(row, 0, agent.memory.action(idx)[0]);
        }

        let mut critic = agent.critic.clone();
        let mut actor_target = agent.actor_target.clone();
        let mut critic_target = agent.critic_target.clone();
        let q = critic.feedforward(&critic_batch(&actions, &states)).clone();
        let target_actions = actor_target.feedforward(&next_states).clone();
        let q_target = critic_target
            .feedforward(&critic_batch(&target_actions, &next_states))
            .clone();

        let mean_abs = agent.train_critic(gamma);

        let mut expected_mean_abs = 0.0;
        for (row, &idx) in agent.batch_indices.iter().enumerate() {
            let expected = q.get(row, 0) - (agent.memory.reward(idx) + gamma * q_target.get(row, 0));
            assert!((agent.critic_errors.get(row, 0) - expected).abs() < 1e-12);
            expected_mean_abs += expected.abs() / 4.0;
        }
        assert!(expected_mean_abs > 0.0);
        assert!((mean_abs - expected_mean_abs).abs() < 1e-12);
    }

    #[test]
    fn test_ddpg_creation() {
        let agent = DdpgBuilder::new(3, 2)
            .actor_layers(vec![16])
            .critic_layers(vec![16, 8])
            .memory_size(50)
            .batch_size(4)
            .seed(1)
            .build()
            .unwrap();

        assert_eq!(agent.actor().input_size(), 3);
        assert_eq!(agent.actor().output_size(), 2);
        assert_eq!(agent.critic().input_size(), 5);
        assert_eq!(agent.critic().output_size(), 1);
        assert_eq!(agent.critic().depth(), 2);
        assert_eq!(agent.memory().capacity(), 50);
        assert_eq!(agent.actor().layers()[1].activation(), Activation::Tanh);
        assert_eq!(agent.critic().layers()[2].activation(), Activation::Linear);
    }

    #[test]
    fn test_noise_length_must_match_actions() {
        let result = DdpgBuilder::new(2, 2).noise(vec![0.1]).build();
        assert!(matches!(result, Err(PallasError::InvalidParameter { .. })));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let json = r#"{
            "state_size": 2,
            "action_size": 1,
            "actor_layers": [8],
            "critic_layers": [8],
            "memory_size": 10,
            "batch_size": 2
        }"#;
        let config: DdpgConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.noise, None);
        assert_eq!(config.actor_adam, AdamConfig::default());
        assert!(config.validate().is_ok());
    }
}
