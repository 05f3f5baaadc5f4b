//! Pendulum swing-up with DDPG.
//!
//! The pendulum starts at a random angle and must be brought upright and held
//! there. Nothing is rendered; each episode prints its mean reward. A policy
//! saved by a previous run in `pendulum.ddpg` is picked up automatically.
//!
//! Run with `cargo run --release --example pendulum`.

use std::f64::consts::PI;

use log::info;
use pallas::algorithms::{DdpgAgent, DdpgBuilder};
use pallas::error::Result;
use pallas::random;
use rand::Rng;

const POLICY_FILE: &str = "pendulum.ddpg";

const MAX_SPEED: f64 = 8.0;
const DT: f64 = 0.05;
const G: f64 = 9.81;
const MASS: f64 = 1.0;
const LENGTH: f64 = 1.0;
const MAX_TORQUE: f64 = 2.0;

const EPISODE_LENGTH: usize = 200;
const EPISODE_COUNT: usize = 100;
const EXPLORATION_EPISODES: usize = 3;
const GAMMA: f64 = 0.99;

/// State `[theta, theta_dot]`, with `theta = 0` pointing up.
struct Pendulum {
    state: [f64; 2],
}

impl Pendulum {
    fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.state = [rng.gen_range(-PI..=PI), 0.0];
    }

    /// Apply `torque` for one time step and return the reward of the state
    /// the step started from.
    fn step(&mut self, torque: f64) -> f64 {
        let [theta, theta_dot] = self.state;
        let cost = theta.powi(2) + 0.1 * theta_dot.powi(2) + 0.001 * torque.powi(2);

        let theta_dot = (theta_dot
            + (3.0 * G / (2.0 * LENGTH) * theta.sin() + 3.0 / (MASS * LENGTH.powi(2)) * torque) * DT)
            .clamp(-MAX_SPEED, MAX_SPEED);
        let mut theta = theta + theta_dot * DT;
        if theta > PI {
            theta -= 2.0 * PI;
        }
        if theta < -PI {
            theta += 2.0 * PI;
        }

        self.state = [theta, theta_dot];
        -cost
    }
}

fn build_agent() -> Result<DdpgAgent> {
    DdpgBuilder::new(2, 1)
        .actor_layers(vec![128, 64])
        .critic_layers(vec![128, 64])
        .noise(vec![0.01])
        .memory_size(100_000)
        .batch_size(32)
        .build()
}

fn main() -> Result<()> {
    env_logger::init();

    let mut agent = build_agent()?;
    match agent.load_policy(POLICY_FILE) {
        Ok(()) => println!("Loaded the pre-trained model."),
        Err(_) => println!("No pre-trained model. Training from scratch."),
    }

    let mut rng = random::seeded(None);
    let mut pendulum = Pendulum { state: [0.0; 2] };
    let mut action = [0.0];

    for episode in 0..EPISODE_COUNT {
        let exploring = episode < EXPLORATION_EPISODES;
        pendulum.reset(&mut rng);
        agent.new_episode();
        agent.observe(&action, 0.0, &pendulum.state, false);

        let mut episode_reward = 0.0;
        for _ in 0..EPISODE_LENGTH {
            action[0] = if exploring {
                rng.gen_range(-1.0..=1.0)
            } else {
                agent.action(&pendulum.state)[0]
            };

            let reward = pendulum.step(MAX_TORQUE * action[0]);
            episode_reward += reward;

            // Episodes are cut off at an arbitrary state, never at a failure,
            // so no transition is terminal.
            agent.observe(&action, reward, &pendulum.state, false);
            if !exploring {
                agent.train(GAMMA);
            }
        }

        agent.update_target_networks();
        info!("episode {} stored transitions {}", episode, agent.memory().len());
        println!("{} {:.6}", episode, episode_reward / EPISODE_LENGTH as f64);
    }

    match agent.save_policy(POLICY_FILE) {
        Ok(()) => println!("Trained model saved."),
        Err(err) => println!("Could not save the trained model: {}", err),
    }
    Ok(())
}
