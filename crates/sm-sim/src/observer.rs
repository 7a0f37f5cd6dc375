//! Simulation observer trait for progress reporting.

use crate::RunReport;

/// Callbacks invoked by [`Simulator::run`][crate::Simulator::run] and
/// [`Simulator::run_events`][crate::Simulator::run_events].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: overflow counter
///
/// ```rust,ignore
/// struct Overflows(u32);
///
/// impl SimObserver for Overflows {
///     fn on_overflow(&mut self, _steps_done: u64) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before a batch of `requested` events, with the cumulative
    /// event count so far.
    fn on_batch_start(&mut self, _steps_done: u64, _requested: u64) {}

    /// Called after every batch, including ones that stopped early.
    fn on_batch_end(&mut self, _report: &RunReport) {}

    /// Called when a queue reaches `max_queue` and the batch stops.
    fn on_overflow(&mut self, _steps_done: u64) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
