//! The random source owned by each network-building call site or agent.
//!
//! There is no process-wide generator. Pass a seed for reproducible runs;
//! without one the generator is seeded from the operating system.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
