//! Run configuration.

use crate::{SmError, SmResult};

/// Parameters of one simulation run.
///
/// Typically built in code or loaded from a TOML/JSON file by the
/// application crate (enable the `serde` feature) and passed to
/// `sm_sim::SimBuilder`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Arrivals to simulate per call to `Simulator::run`.  Default: 1,000,000.
    pub number_events: u64,

    /// Queue capacity per node.  A run stops as soon as any queue reaches
    /// this length; it also sizes the queue-length histogram.  Default: 1000.
    pub max_queue: u32,

    /// Seed applied before the first run.  `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Virtual-queue drains allowed per arrival.  Default: 1.
    pub max_drains_per_event: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            number_events:        1_000_000,
            max_queue:            1_000,
            seed:                 None,
            max_drains_per_event: 1,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> SmResult<()> {
        if self.max_queue == 0 {
            return Err(SmError::Config("max_queue must be at least 1".into()));
        }
        if self.max_drains_per_event == 0 {
            return Err(SmError::Config("max_drains_per_event must be at least 1".into()));
        }
        Ok(())
    }
}
