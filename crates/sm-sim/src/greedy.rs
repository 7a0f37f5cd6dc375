//! Greedy queue-size matching engine.
//!
//! An arrival is matched immediately whenever possible:
//!
//! ```text
//! queue_size[node] > 0   → no new match can exist; push (stop on overflow).
//! otherwise              → feasible edges of node = edges whose *other*
//!                          nodes all hold at least one item.
//!     none               → the item waits (queue becomes 1).
//!     one                → take it.
//!     several            → the Selector picks one.
//! ```
//!
//! A match removes one item from every other node of the chosen edge and
//! consumes the arrival itself.  Candidate weights are the summed queue
//! lengths of the other nodes (for a simple graph: the neighbour's queue).

use sm_core::{AliasTable, EdgeId, NodeId, SimRng};
use sm_graph::Incidence;

use crate::state::{saturated, GreedyState, Logs};

/// Tie-breaking rule among several feasible edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selector {
    /// Uniformly at random.
    RandomNode,
    /// Largest (summed) queue; first candidate wins ties.
    LongestQueue,
    /// At random, proportionally to the (summed) queue.
    RandomItem,
}

impl Selector {
    /// Index into `choices` of the selected candidate.  `choices` is non-empty.
    fn pick(self, choices: &[(u32, u64)], rng: &mut SimRng) -> usize {
        match self {
            Selector::RandomNode => rng.gen_index(choices.len()),
            Selector::LongestQueue => {
                let mut best = 0;
                for (i, &(_, w)) in choices.iter().enumerate().skip(1) {
                    if w > choices[best].1 {
                        best = i;
                    }
                }
                best
            }
            Selector::RandomItem => {
                let total: u64 = choices.iter().map(|&(_, w)| w).sum();
                let mut target = total as f64 * rng.gen_unit();
                let mut i = 0;
                while target > choices[i].1 as f64 && i + 1 < choices.len() {
                    target -= choices[i].1 as f64;
                    i += 1;
                }
                i
            }
        }
    }
}

/// Engine borrowing the immutable inputs of a greedy run.
#[derive(Clone, Copy, Debug)]
pub struct GreedyEngine<'a> {
    table:     &'a AliasTable,
    incidence: &'a Incidence,
    selector:  Selector,
}

impl<'a> GreedyEngine<'a> {
    pub fn new(table: &'a AliasTable, incidence: &'a Incidence, selector: Selector) -> Self {
        debug_assert_eq!(table.len(), incidence.node_count());
        Self { table, incidence, selector }
    }

    /// Simulate up to `number_events` arrivals.  Same contract as
    /// [`VirtualQueueEngine::run`](crate::VirtualQueueEngine::run).
    pub fn run(
        &self,
        number_events: u64,
        seed:          Option<u64>,
        rng:           &mut SimRng,
        state:         &mut GreedyState,
        logs:          &mut Logs,
    ) -> u64 {
        if let Some(seed) = seed {
            rng.reseed(seed);
        }
        debug_assert_eq!(state.queue_size.len(), self.incidence.node_count());
        debug_assert_eq!(logs.trafic.len(), self.incidence.edge_count());

        if saturated(&state.queue_size, logs.queue_log.max_queue()) {
            return logs.steps_done;
        }

        let mut completed = 0;
        for _ in 0..number_events {
            logs.queue_log.record(&state.queue_size);
            let node = self.table.sample(rng);
            if !self.process_arrival(node, rng, state, logs) {
                break;
            }
            completed += 1;
        }
        logs.steps_done += completed;
        logs.steps_done
    }

    /// Run a recorded arrival sequence.  `rng` is only used by the
    /// randomised selectors.
    pub fn replay(
        &self,
        arrivals: &[NodeId],
        rng:      &mut SimRng,
        state:    &mut GreedyState,
        logs:     &mut Logs,
    ) -> u64 {
        if saturated(&state.queue_size, logs.queue_log.max_queue()) {
            return logs.steps_done;
        }
        let mut completed = 0;
        for &node in arrivals {
            logs.queue_log.record(&state.queue_size);
            if !self.process_arrival(node, rng, state, logs) {
                break;
            }
            completed += 1;
        }
        logs.steps_done += completed;
        logs.steps_done
    }

    /// Handle an arrival at `node`.  Returns `false` on overflow.
    fn process_arrival(
        &self,
        node:  NodeId,
        rng:   &mut SimRng,
        state: &mut GreedyState,
        logs:  &mut Logs,
    ) -> bool {
        let max_queue = logs.queue_log.max_queue();
        if state.queue_size[node.index()] > 0 {
            state.queue_size[node.index()] += 1;
            return (state.queue_size[node.index()] as usize) < max_queue;
        }

        self.collect_choices(node, state);
        let chosen = match state.choices.len() {
            0 => {
                state.queue_size[node.index()] = 1;
                return 1 < max_queue;
            }
            1 => state.choices[0].0,
            _ => state.choices[self.selector.pick(&state.choices, rng)].0,
        };

        logs.trafic[chosen as usize] += 1;
        for &j in self.incidence.node_slice(EdgeId(chosen)) {
            if j != node.0 {
                state.queue_size[j as usize] -= 1;
            }
        }
        true
    }

    /// Fill `state.choices` with the feasible edges of `node`.
    fn collect_choices(&self, node: NodeId, state: &mut GreedyState) {
        state.choices.clear();
        'edges: for &e in self.incidence.edge_slice(node) {
            let mut weight = 0u64;
            for &j in self.incidence.node_slice(EdgeId(e)) {
                if j == node.0 {
                    continue;
                }
                let q = state.queue_size[j as usize];
                if q == 0 {
                    continue 'edges;
                }
                weight += q as u64;
            }
            state.choices.push((e, weight));
        }
    }
}
