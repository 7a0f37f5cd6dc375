//! Independent replicas of one simulation, one per seed.

use crate::{NoopObserver, SimBuilder, SimResult, Simulator};

/// Build and run one [`Simulator`] per seed, each for `config.number_events`
/// events, and return them in seed order.
///
/// Replicas share nothing but the (cloned) inputs, so results are identical
/// with or without the `parallel` feature.
pub fn run_replicas(builder: &SimBuilder, seeds: &[u64]) -> SimResult<Vec<Simulator>> {
    #[cfg(not(feature = "parallel"))]
    {
        seeds.iter().map(|&seed| run_one(builder, seed)).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        seeds.par_iter().map(|&seed| run_one(builder, seed)).collect()
    }
}

fn run_one(builder: &SimBuilder, seed: u64) -> SimResult<Simulator> {
    let mut sim = builder.clone().seed(seed).build()?;
    sim.run(&mut NoopObserver)?;
    Ok(sim)
}
