//! Fluent builder for constructing a [`Simulator`].

use sm_core::{AliasTable, SimConfig, SimRng};
use sm_graph::Incidence;

use crate::state::{EngineState, Logs};
use crate::{Policy, SimError, SimResult, Simulator};

/// Fluent builder for [`Simulator`].
///
/// # Required inputs
///
/// - [`Incidence`]: the compatibility hypergraph
/// - `rates`: one arrival rate per node (finite, non-negative, not all zero)
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                   |
/// |---------------------|-------------------------------------------|
/// | `.config(c)`        | `SimConfig::default()`                    |
/// | `.policy(p)`        | `Policy::VirtualQueue`                    |
/// | `.seed(s)`          | `config.seed`                             |
/// | `.alias_table(t)`   | built from `rates` with Vose's method     |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(incidence, vec![1.0, 2.0, 1.0])
///     .config(SimConfig { number_events: 10_000, ..Default::default() })
///     .seed(42)
///     .build()?;
/// let report = sim.run(&mut NoopObserver)?;
/// ```
#[derive(Clone, Debug)]
pub struct SimBuilder {
    incidence: Incidence,
    rates:     Vec<f64>,
    config:    SimConfig,
    policy:    Policy,
    table:     Option<AliasTable>,
}

impl SimBuilder {
    pub fn new(incidence: Incidence, rates: Vec<f64>) -> Self {
        Self {
            incidence,
            rates,
            config: SimConfig::default(),
            policy: Policy::default(),
            table:  None,
        }
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for setting `config.seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Use a precomputed alias table instead of deriving one from `rates`.
    ///
    /// The table must have one column per node; `rates` are still used by
    /// the waiting-time statistics.
    pub fn alias_table(mut self, table: AliasTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Validate inputs, build the alias table and zeroed state, and return a
    /// ready-to-run [`Simulator`].
    pub fn build(self) -> SimResult<Simulator> {
        self.config.validate()?;

        let n = self.incidence.node_count();
        let m = self.incidence.edge_count();
        if n == 0 {
            return Err(SimError::EmptyGraph);
        }
        if self.rates.len() != n {
            return Err(SimError::NodeCountMismatch {
                expected: n,
                got:      self.rates.len(),
                what:     "arrival rates",
            });
        }

        let table = match self.table {
            Some(t) => {
                if t.len() != n {
                    return Err(SimError::NodeCountMismatch {
                        expected: n,
                        got:      t.len(),
                        what:     "alias table",
                    });
                }
                t
            }
            None => AliasTable::from_rates(&self.rates)?,
        };

        let state = EngineState::new(self.policy, &self.incidence, self.config.max_queue as usize);

        let rng = match self.config.seed {
            Some(seed) => SimRng::new(seed),
            None       => SimRng::from_entropy(),
        };

        Ok(Simulator {
            logs:         Logs::new(n, m, self.config.max_queue as usize),
            seed_pending: self.config.seed,
            config:       self.config,
            incidence:    self.incidence,
            rates:        self.rates,
            table,
            rng,
            state,
        })
    }
}
