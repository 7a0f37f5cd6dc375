//! Steady-state estimates from simulation logs.
//!
//! Queue statistics are normalised by the number of queue-log snapshots,
//! which equals `steps_done` except after an overflow (the overflowing
//! event is logged but not counted).  Traffic rates use `steps_done`.

use crate::state::Logs;
use crate::{SimError, SimResult};

/// Time-averaged queue length of every node.
pub fn average_queues(logs: &Logs) -> SimResult<Vec<f64>> {
    let total = snapshots(logs)?;
    Ok(logs
        .queue_log
        .rows()
        .map(|row| {
            let weighted: u64 = row.iter().enumerate().map(|(s, &c)| s as u64 * c).sum();
            weighted as f64 / total
        })
        .collect())
}

/// Complementary cumulative distribution of every node's queue length.
///
/// Row `i` has `max_queue + 1` entries; entry `s` is the fraction of time
/// node `i` held at least `s` items, so it starts at 1 and ends at 0.
pub fn ccdf(logs: &Logs) -> SimResult<Vec<Vec<f64>>> {
    let total = snapshots(logs)?;
    Ok(logs
        .queue_log
        .rows()
        .map(|row| {
            let mut out = Vec::with_capacity(row.len() + 1);
            let mut below = 0u64;
            out.push(1.0);
            for &c in row {
                below += c;
                out.push((total - below as f64) / total);
            }
            out
        })
        .collect())
}

/// Mean waiting time of an item over all nodes (Little's law).
pub fn total_waiting_time(logs: &Logs, rates: &[f64]) -> SimResult<f64> {
    let queues: f64 = average_queues(logs)?.iter().sum();
    Ok(queues / rates.iter().sum::<f64>())
}

/// Mean waiting time of an item at each node.  Zero-rate nodes give `NaN`.
pub fn average_waiting_times(logs: &Logs, rates: &[f64]) -> SimResult<Vec<f64>> {
    Ok(average_queues(logs)?
        .into_iter()
        .zip(rates)
        .map(|(q, &mu)| q / mu)
        .collect())
}

/// Matches per event on each edge.
pub fn traffic_rates(logs: &Logs) -> SimResult<Vec<f64>> {
    if logs.steps_done == 0 {
        return Err(SimError::NoSteps);
    }
    let steps = logs.steps_done as f64;
    Ok(logs.trafic.iter().map(|&t| t as f64 / steps).collect())
}

fn snapshots(logs: &Logs) -> SimResult<f64> {
    match logs.queue_log.snapshots() {
        0 => Err(SimError::NoSteps),
        s => Ok(s as f64),
    }
}
