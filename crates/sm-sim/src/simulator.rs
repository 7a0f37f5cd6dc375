//! The `Simulator` struct and its batch loop.

use sm_core::{AliasTable, SimConfig, SimRng};
use sm_graph::Incidence;
use tracing::{debug, debug_span, warn};

use crate::fcfm::FcfmEngine;
use crate::greedy::GreedyEngine;
use crate::state::{saturated, EngineState, Logs};
use crate::vq::VirtualQueueEngine;
use crate::{stats, Policy, SimObserver, SimResult};

// ── RunReport ─────────────────────────────────────────────────────────────────

/// Outcome of one batch of events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    /// Events asked for in this batch.
    pub requested:  u64,
    /// Events completed in this batch.
    pub completed:  u64,
    /// Cumulative events since the last reset.
    pub steps_done: u64,
    /// A queue reached `max_queue`; the batch stopped early.
    pub overflowed: bool,
}

// ── Simulator ─────────────────────────────────────────────────────────────────

/// Owns a matching problem, its policy state, logs and RNG.
///
/// Successive calls to [`run`](Self::run) continue from the current state,
/// so a long simulation can be split into batches (e.g. a warm-up batch
/// followed by [`Logs::clear`] via [`reset_logs`](Self::reset_logs)).
///
/// Create via [`SimBuilder`][crate::SimBuilder].
#[derive(Clone, Debug)]
pub struct Simulator {
    pub(crate) config:       SimConfig,
    pub(crate) incidence:    Incidence,
    pub(crate) rates:        Vec<f64>,
    pub(crate) table:        AliasTable,
    pub(crate) rng:          SimRng,
    pub(crate) state:        EngineState,
    pub(crate) logs:         Logs,
    /// Seed to apply at the start of the next batch.
    pub(crate) seed_pending: Option<u64>,
}

impl Simulator {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run `config.number_events` events from the current state.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunReport> {
        self.run_events(self.config.number_events, observer)
    }

    /// Run up to `n` events from the current state.
    ///
    /// The configured seed is applied on the first batch after build or
    /// [`reset`](Self::reset); later batches continue the RNG stream.
    pub fn run_events<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<RunReport> {
        let policy = self.policy();
        let span = debug_span!("run_events", %policy, requested = n);
        let _guard = span.enter();

        let before = self.logs.steps_done;
        observer.on_batch_start(before, n);

        let seed = self.seed_pending.take();
        let steps_done = match &mut self.state {
            EngineState::VirtualQueue(state) => {
                VirtualQueueEngine::new(&self.table, &self.incidence)
                    .with_max_drains(self.config.max_drains_per_event)
                    .run(n, seed, &mut self.rng, state, &mut self.logs)
            }
            EngineState::Greedy { selector, state } => {
                GreedyEngine::new(&self.table, &self.incidence, *selector)
                    .run(n, seed, &mut self.rng, state, &mut self.logs)
            }
            EngineState::Fcfm(state) => {
                FcfmEngine::new(&self.table, &self.incidence)
                    .run(n, seed, &mut self.rng, state, &mut self.logs)
            }
        };

        let completed = steps_done - before;
        let report = RunReport {
            requested:  n,
            completed,
            steps_done,
            overflowed: completed < n,
        };

        if report.overflowed {
            warn!(
                steps_done,
                max_queue = self.config.max_queue,
                "queue reached max_queue; batch stopped after {completed} of {n} events"
            );
            observer.on_overflow(steps_done);
        } else {
            debug!(steps_done, trafic = self.logs.total_trafic(), "batch complete");
        }
        observer.on_batch_end(&report);
        Ok(report)
    }

    /// Zero the state and logs and rewind the RNG to `config.seed`.
    ///
    /// Without a configured seed the RNG stream simply continues.
    pub fn reset(&mut self) {
        self.state.clear();
        self.logs.clear();
        self.seed_pending = self.config.seed;
    }

    /// Zero the logs but keep the queue state, e.g. to discard a warm-up
    /// period.  Keeps the RNG stream.
    pub fn reset_logs(&mut self) {
        self.logs.clear();
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn policy(&self) -> Policy {
        self.state.policy()
    }

    pub fn incidence(&self) -> &Incidence {
        &self.incidence
    }

    /// Arrival rate of each node, as given to the builder.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn alias_table(&self) -> &AliasTable {
        &self.table
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn logs(&self) -> &Logs {
        &self.logs
    }

    pub fn queue_size(&self) -> &[u32] {
        self.state.queue_size()
    }

    pub fn steps_done(&self) -> u64 {
        self.logs.steps_done
    }

    /// Some queue sits at `max_queue`; further batches do nothing until
    /// [`reset`](Self::reset).
    pub fn is_saturated(&self) -> bool {
        saturated(self.state.queue_size(), self.logs.queue_log.max_queue())
    }

    // ── Statistics ────────────────────────────────────────────────────────

    pub fn average_queues(&self) -> SimResult<Vec<f64>> {
        stats::average_queues(&self.logs)
    }

    pub fn ccdf(&self) -> SimResult<Vec<Vec<f64>>> {
        stats::ccdf(&self.logs)
    }

    pub fn total_waiting_time(&self) -> SimResult<f64> {
        stats::total_waiting_time(&self.logs, &self.rates)
    }

    pub fn average_waiting_times(&self) -> SimResult<Vec<f64>> {
        stats::average_waiting_times(&self.logs, &self.rates)
    }

    pub fn traffic_rates(&self) -> SimResult<Vec<f64>> {
        stats::traffic_rates(&self.logs)
    }
}
