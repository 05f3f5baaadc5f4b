//! Fit `y = x1² - x2²` on `[-1, 1]²` with a 2-64-1 network and Adam.
//!
//! Run with `cargo run --example saddle`. Set `RUST_LOG=debug` for library logs.

use pallas::activations::Activation;
use pallas::error::Result;
use pallas::loss::Loss;
use pallas::matrix::Matrix;
use pallas::network::NeuralNetwork;
use pallas::optimizer::{Adam, Optimizer};
use pallas::random;
use rand::rngs::StdRng;

const STEPS: usize = 10_000;
const BATCH: usize = 32;
const REPORT_EVERY: usize = 100;

fn saddle(x1: f64, x2: f64) -> f64 {
    x1 * x1 - x2 * x2
}

fn sample(x: &mut Matrix, y: &mut Matrix, rng: &mut StdRng) {
    x.randomize(-1.0, 1.0, rng);
    for row in 0..y.rows() {
        y.set(row, 0, saddle(x.get(row, 0), x.get(row, 1)));
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = random::seeded(None);
    let mut network = NeuralNetwork::new(2, 1, &[64], Activation::Relu, Activation::Linear, BATCH, &mut rng);
    let mut adam = Adam::new(&network);
    let mut x = Matrix::new(BATCH, 2);
    let mut y = Matrix::new(BATCH, 1);

    let mut loss = 0.0;
    for step in 1..=STEPS {
        sample(&mut x, &mut y, &mut rng);
        network.feedforward(&x);
        loss += network.backpropagate(&y, Loss::Mse);
        adam.step(&mut network);

        if step % REPORT_EVERY == 0 {
            println!("{} {:.6}", step, loss / REPORT_EVERY as f64);
            loss = 0.0;
        }
    }

    network.save_weights("saddle.weights")?;
    println!("Weights saved to saddle.weights");
    Ok(())
}
