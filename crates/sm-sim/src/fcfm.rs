//! First-come first-matched (FCFM) engine.
//!
//! Same immediate-matching skeleton as the greedy engine, but every waiting
//! item remembers its arrival age so the oldest items are served first:
//!
//! ```text
//! queue_size[node] > 0   → push the arrival's age (stop on overflow).
//! otherwise              → feasible edges of node, as in the greedy engine.
//!     none               → the item waits with its age.
//!     one                → take it.
//!     several            → take the edge whose oldest waiting item is the
//!                          oldest of all; first candidate wins ties.
//! ```
//!
//! An edge's age is the minimum, over its other nodes, of the age at the
//! head of their queues.  On a simple graph that is just the neighbour's
//! oldest item.  An edge with no other node has no age and is taken only
//! when nothing else is feasible.  A match pops the head of every other
//! node of the chosen edge.

use sm_core::{AliasTable, EdgeId, NodeId, SimRng};
use sm_graph::Incidence;

use crate::state::{saturated, FcfmState, Logs};

/// Engine borrowing the immutable inputs of an FCFM run.
#[derive(Clone, Copy, Debug)]
pub struct FcfmEngine<'a> {
    table:     &'a AliasTable,
    incidence: &'a Incidence,
}

impl<'a> FcfmEngine<'a> {
    pub fn new(table: &'a AliasTable, incidence: &'a Incidence) -> Self {
        debug_assert_eq!(table.len(), incidence.node_count());
        Self { table, incidence }
    }

    /// Simulate up to `number_events` arrivals.  Same contract as
    /// [`VirtualQueueEngine::run`](crate::VirtualQueueEngine::run).
    pub fn run(
        &self,
        number_events: u64,
        seed:          Option<u64>,
        rng:           &mut SimRng,
        state:         &mut FcfmState,
        logs:          &mut Logs,
    ) -> u64 {
        if let Some(seed) = seed {
            rng.reseed(seed);
        }
        debug_assert_eq!(state.queue_size.len(), self.incidence.node_count());
        debug_assert_eq!(state.capacity(), logs.queue_log.max_queue());

        if saturated(&state.queue_size, logs.queue_log.max_queue()) {
            return logs.steps_done;
        }

        let mut completed = 0;
        for _ in 0..number_events {
            logs.queue_log.record(&state.queue_size);
            let node = self.table.sample(rng);
            if !self.process_arrival(node, state, logs) {
                break;
            }
            completed += 1;
        }
        logs.steps_done += completed;
        logs.steps_done
    }

    /// Run a recorded arrival sequence.  The policy is deterministic, so no
    /// RNG is needed.
    pub fn replay(&self, arrivals: &[NodeId], state: &mut FcfmState, logs: &mut Logs) -> u64 {
        if saturated(&state.queue_size, logs.queue_log.max_queue()) {
            return logs.steps_done;
        }
        let mut completed = 0;
        for &node in arrivals {
            logs.queue_log.record(&state.queue_size);
            if !self.process_arrival(node, state, logs) {
                break;
            }
            completed += 1;
        }
        logs.steps_done += completed;
        logs.steps_done
    }

    /// Handle an arrival at `node`.  Returns `false` on overflow.
    fn process_arrival(&self, node: NodeId, state: &mut FcfmState, logs: &mut Logs) -> bool {
        let max_queue = logs.queue_log.max_queue();
        let age = state.clock;
        state.clock += 1;

        let i = node.index();
        if state.queue_size[i] > 0 {
            state.push(i, age);
            return (state.queue_size[i] as usize) < max_queue;
        }

        self.collect_choices(node, state);
        let chosen = match state.choices.len() {
            0 => {
                state.push(i, age);
                return 1 < max_queue;
            }
            1 => state.choices[0].0,
            _ => state.choices[oldest_choice(&state.choices)].0,
        };

        logs.trafic[chosen as usize] += 1;
        for &j in self.incidence.node_slice(EdgeId(chosen)) {
            if j != node.0 {
                state.pop(j as usize);
            }
        }
        true
    }

    /// Fill `state.choices` with the feasible edges of `node` and their age.
    fn collect_choices(&self, node: NodeId, state: &mut FcfmState) {
        state.choices.clear();
        'edges: for &e in self.incidence.edge_slice(node) {
            // No other node: no age, lowest priority.
            let mut age = u64::MAX;
            for &j in self.incidence.node_slice(EdgeId(e)) {
                if j == node.0 {
                    continue;
                }
                if state.queue_size[j as usize] == 0 {
                    continue 'edges;
                }
                age = age.min(state.oldest(j as usize));
            }
            state.choices.push((e, age));
        }
    }
}

/// Index of the candidate with the smallest age; first one on ties.
/// `choices` is non-empty.
fn oldest_choice(choices: &[(u32, u64)]) -> usize {
    let mut best = 0;
    for (i, &(_, age)) in choices.iter().enumerate().skip(1) {
        if age < choices[best].1 {
            best = i;
        }
    }
    best
}
