//! Virtual-queue matching engine.
//!
//! # Per-event loop
//!
//! ```text
//! ① Log     : queue_log[j][queue_size[j]] += 1 for every node j.
//! ② Arrival : draw a node from the alias table.
//! ③ Push    : queue_size[node] += 1; stop if it reaches max_queue
//!             (that event does not count as completed).
//! ④ Scores  : every edge of the node gains one point; if the node was
//!             empty, re-check readiness of those edges.
//! ⑤ Commit  : the best-scoring edge (lowest index on ties), if its score
//!             is positive, gets one more virtual match; every edge sharing
//!             a node with it loses one point per shared node.
//! ⑥ Drain   : scan edges in index order and serve ready edges with a
//!             virtual backlog, up to `max_drains_per_event` of them.
//! ```
//!
//! Arrivals never block on feasibility: an edge can be committed before its
//! nodes hold any items, and the commitment waits in `vq` until the edge
//! becomes ready.  No heap allocation happens inside the loop.

use sm_core::{AliasTable, EdgeId, NodeId, SimRng};
use sm_graph::Incidence;

use crate::state::{saturated, Logs, VqState};

/// Engine borrowing the immutable inputs of a virtual-queue run.
///
/// All mutable state is passed to [`run`](Self::run), so one engine can
/// drive any number of independent state/log pairs.
#[derive(Clone, Copy, Debug)]
pub struct VirtualQueueEngine<'a> {
    table:                &'a AliasTable,
    incidence:            &'a Incidence,
    max_drains_per_event: u32,
}

impl<'a> VirtualQueueEngine<'a> {
    /// Engine with the default of one drain per event.
    pub fn new(table: &'a AliasTable, incidence: &'a Incidence) -> Self {
        debug_assert_eq!(table.len(), incidence.node_count());
        Self { table, incidence, max_drains_per_event: 1 }
    }

    /// Allow up to `k` virtual-queue drains per arrival (minimum 1).
    pub fn with_max_drains(mut self, k: u32) -> Self {
        self.max_drains_per_event = k.max(1);
        self
    }

    /// Simulate up to `number_events` arrivals.
    ///
    /// If `seed` is given, `rng` is reseeded first; otherwise its stream
    /// continues.  Returns the new cumulative `logs.steps_done`.  A value
    /// below `steps_done + number_events` means a queue reached
    /// `max_queue` (the histogram width) and the run stopped early.
    pub fn run(
        &self,
        number_events: u64,
        seed:          Option<u64>,
        rng:           &mut SimRng,
        state:         &mut VqState,
        logs:          &mut Logs,
    ) -> u64 {
        if let Some(seed) = seed {
            rng.reseed(seed);
        }
        self.debug_check(state, logs);

        let max_queue = logs.queue_log.max_queue();
        if saturated(&state.queue_size, max_queue) {
            return logs.steps_done;
        }

        let mut completed = 0;
        for _ in 0..number_events {
            let node = self.sample_arrival(rng);
            if !self.process_arrival(node, state, logs) {
                break;
            }
            completed += 1;
        }
        logs.steps_done += completed;
        logs.steps_done
    }

    /// Run a recorded arrival sequence instead of random draws.
    ///
    /// Same semantics as [`run`](Self::run), including the early stop.
    pub fn replay(&self, arrivals: &[NodeId], state: &mut VqState, logs: &mut Logs) -> u64 {
        self.debug_check(state, logs);
        if saturated(&state.queue_size, logs.queue_log.max_queue()) {
            return logs.steps_done;
        }
        let mut completed = 0;
        for &node in arrivals {
            if !self.process_arrival(node, state, logs) {
                break;
            }
            completed += 1;
        }
        logs.steps_done += completed;
        logs.steps_done
    }

    /// One full event for an arrival at `node`.  Returns `false` on overflow.
    fn process_arrival(&self, node: NodeId, state: &mut VqState, logs: &mut Logs) -> bool {
        logs.queue_log.record(&state.queue_size);

        if !apply_arrival(state, node, logs.queue_log.max_queue()) {
            return false;
        }
        self.update_scores(state, node);

        if let Some(edge) = select_best_edge(&state.scores) {
            self.commit(state, edge);
        }

        let mut drains = 0;
        for e in 0..state.vq.len() {
            if drains == self.max_drains_per_event {
                break;
            }
            if state.ready_edges[e] && state.vq[e] > 0 {
                self.drain_one(state, logs, EdgeId(e as u32));
                drains += 1;
            }
        }
        true
    }

    #[inline]
    fn sample_arrival(&self, rng: &mut SimRng) -> NodeId {
        self.table.sample(rng)
    }

    /// Score every edge of `node`; refresh readiness if `node` just became
    /// non-empty.
    #[inline]
    fn update_scores(&self, state: &mut VqState, node: NodeId) {
        let just_filled = state.queue_size[node.index()] == 1;
        for &e in self.incidence.edge_slice(node) {
            let e = e as usize;
            state.scores[e] += 1;
            if just_filled {
                state.ready_edges[e] = self
                    .incidence
                    .node_slice(EdgeId(e as u32))
                    .iter()
                    .all(|&j| state.queue_size[j as usize] > 0);
            }
        }
    }

    /// Add a virtual match on `edge` and charge every edge that shares one
    /// of its nodes (once per shared node).
    #[inline]
    fn commit(&self, state: &mut VqState, edge: EdgeId) {
        state.vq[edge.index()] += 1;
        for &j in self.incidence.node_slice(edge) {
            for &f in self.incidence.edge_slice(NodeId(j)) {
                state.scores[f as usize] -= 1;
            }
        }
    }

    /// Serve one virtual match on a ready `edge`.
    #[inline]
    fn drain_one(&self, state: &mut VqState, logs: &mut Logs, edge: EdgeId) {
        state.vq[edge.index()] -= 1;
        logs.trafic[edge.index()] += 1;
        for &j in self.incidence.node_slice(edge) {
            let q = &mut state.queue_size[j as usize];
            debug_assert!(*q > 0, "drained empty queue on node {j}");
            *q -= 1;
            if *q == 0 {
                for &f in self.incidence.edge_slice(NodeId(j)) {
                    state.ready_edges[f as usize] = false;
                }
            }
        }
    }

    fn debug_check(&self, state: &VqState, logs: &Logs) {
        let n = self.incidence.node_count();
        let m = self.incidence.edge_count();
        debug_assert_eq!(self.table.len(), n);
        debug_assert_eq!(state.queue_size.len(), n);
        debug_assert_eq!(state.ready_edges.len(), m);
        debug_assert_eq!(state.scores.len(), m);
        debug_assert_eq!(state.vq.len(), m);
        debug_assert_eq!(logs.trafic.len(), m);
        debug_assert_eq!(logs.queue_log.node_count(), n);
    }
}

/// Push one item on `node`.  Returns `false` if the queue reached `max_queue`.
#[inline]
fn apply_arrival(state: &mut VqState, node: NodeId, max_queue: usize) -> bool {
    let q = &mut state.queue_size[node.index()];
    *q += 1;
    (*q as usize) < max_queue
}

/// Highest-scoring edge (lowest index among ties), if its score is positive.
#[inline]
pub(crate) fn select_best_edge(scores: &[i32]) -> Option<EdgeId> {
    let mut best = 0;
    for (e, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = e;
        }
    }
    match scores.get(best) {
        Some(&s) if s > 0 => Some(EdgeId(best as u32)),
        _ => None,
    }
}
