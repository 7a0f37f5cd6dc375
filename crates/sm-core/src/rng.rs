//! Deterministic, caller-owned random generator.
//!
//! # Determinism strategy
//!
//! Every simulator owns exactly one `SimRng`.  There is no process-wide
//! generator: two simulators never share random state, so they can be run
//! interleaved or on different threads without changing each other's
//! streams.  Reproducibility is controlled by the seed alone:
//!
//! - `SimRng::new(seed)` always yields the same stream for the same seed.
//! - `reseed(seed)` rewinds an existing generator to that stream.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulation random generator.
///
/// Hand each worker its own instance.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy.  Runs using this are not reproducible.
    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// Restart the stream as if freshly created with `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.0 = SmallRng::seed_from_u64(seed);
    }

    /// Uniform index in `0..n`.  `n` must be non-zero.
    #[inline]
    pub fn gen_index(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }

    /// Uniform `f64` in `[0, 1)`.
    #[inline]
    pub fn gen_unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}
