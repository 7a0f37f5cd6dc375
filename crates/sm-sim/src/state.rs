//! Mutable simulation state: per-policy queue state plus the shared logs.
//!
//! Everything here is allocated once, sized by the graph and `max_queue`,
//! and only its integer counters change while a simulation runs.

use sm_core::NodeId;
use sm_graph::Incidence;

use crate::greedy::Selector;
use crate::Policy;

// ── QueueLog ──────────────────────────────────────────────────────────────────

/// Per-node histogram of queue lengths over time.
///
/// Row-major `node_count × max_queue` counters.  Each event adds one to
/// `[node][queue_size[node]]` for every node, so a row's sum is the number
/// of snapshots taken and `row[s] / snapshots` is the fraction of time the
/// node spent at length `s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueLog {
    max_queue: usize,
    counts:    Vec<u64>,
    snapshots: u64,
}

impl QueueLog {
    /// `max_queue` is clamped to at least 1 so every row can hold the
    /// empty-queue bucket.
    pub fn new(node_count: usize, max_queue: usize) -> Self {
        let max_queue = max_queue.max(1);
        Self {
            max_queue,
            counts: vec![0; node_count * max_queue],
            snapshots: 0,
        }
    }

    /// Add one snapshot of `queue_size`.
    #[inline]
    pub fn record(&mut self, queue_size: &[u32]) {
        debug_assert_eq!(queue_size.len() * self.max_queue, self.counts.len());
        for (row, &q) in self.counts.chunks_exact_mut(self.max_queue).zip(queue_size) {
            row[q as usize] += 1;
        }
        self.snapshots += 1;
    }

    pub fn node_count(&self) -> usize {
        self.counts.len().checked_div(self.max_queue).unwrap_or(0)
    }

    pub fn max_queue(&self) -> usize {
        self.max_queue
    }

    /// Number of snapshots recorded (the common sum of every row).
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    /// How many snapshots saw `node` with exactly `size` items.
    pub fn get(&self, node: NodeId, size: usize) -> u64 {
        self.row(node)[size]
    }

    pub fn row(&self, node: NodeId) -> &[u64] {
        let start = node.index() * self.max_queue;
        &self.counts[start..start + self.max_queue]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u64]> + '_ {
        self.counts.chunks_exact(self.max_queue)
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
        self.snapshots = 0;
    }
}

// ── Logs ──────────────────────────────────────────────────────────────────────

/// Monitored outputs shared by every policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logs {
    /// Completed matches per edge (cumulative).
    pub trafic:     Vec<u64>,
    /// Queue-length histogram per node.
    pub queue_log:  QueueLog,
    /// Events completed across all runs since the last reset.
    pub steps_done: u64,
}

impl Logs {
    pub fn new(node_count: usize, edge_count: usize, max_queue: usize) -> Self {
        Self {
            trafic:     vec![0; edge_count],
            queue_log:  QueueLog::new(node_count, max_queue),
            steps_done: 0,
        }
    }

    /// Total matches completed across all edges.
    pub fn total_trafic(&self) -> u64 {
        self.trafic.iter().sum()
    }

    pub fn clear(&mut self) {
        self.trafic.fill(0);
        self.queue_log.clear();
        self.steps_done = 0;
    }
}

// ── VqState ───────────────────────────────────────────────────────────────────

/// Inner state of the virtual-queue policy.
///
/// Must be consistent with `queue_size` when handed to the engine; the
/// all-zero state from [`VqState::new`] is the usual cold start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VqState {
    /// Per edge: every node of the edge had a non-empty queue when last checked.
    pub ready_edges: Vec<bool>,
    /// Per edge: arrivals favouring the edge minus items already committed.
    /// May go negative.
    pub scores:      Vec<i32>,
    /// Per edge: committed matches not yet drained.
    pub vq:          Vec<u32>,
    /// Per node: physical queue length.
    pub queue_size:  Vec<u32>,
}

impl VqState {
    pub fn new(node_count: usize, edge_count: usize) -> Self {
        Self {
            ready_edges: vec![false; edge_count],
            scores:      vec![0; edge_count],
            vq:          vec![0; edge_count],
            queue_size:  vec![0; node_count],
        }
    }

    pub fn clear(&mut self) {
        self.ready_edges.fill(false);
        self.scores.fill(0);
        self.vq.fill(0);
        self.queue_size.fill(0);
    }
}

// ── GreedyState ───────────────────────────────────────────────────────────────

/// Inner state of the greedy queue-size policies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreedyState {
    /// Per node: physical queue length.
    pub queue_size: Vec<u32>,
    /// Scratch list of `(edge, weight)` candidates, reused every event.
    pub(crate) choices: Vec<(u32, u64)>,
}

impl GreedyState {
    /// `max_degree` pre-sizes the candidate buffer so events never allocate.
    pub fn new(node_count: usize, max_degree: usize) -> Self {
        Self {
            queue_size: vec![0; node_count],
            choices:    Vec::with_capacity(max_degree),
        }
    }

    pub fn clear(&mut self) {
        self.queue_size.fill(0);
        self.choices.clear();
    }
}

// ── FcfmState ─────────────────────────────────────────────────────────────────

/// Inner state of the first-come first-matched policy.
///
/// Each node keeps a ring buffer of the arrival ages of its waiting items,
/// oldest at `queue_start[node]`:
///
/// ```text
/// items[node * capacity + (queue_start[node] + k) % capacity]   k-th oldest
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FcfmState {
    /// Per node: physical queue length.
    pub queue_size:  Vec<u32>,
    /// Per node: ring slot of the oldest waiting item.
    pub queue_start: Vec<u32>,
    /// Row-major `node_count × capacity` arrival ages.
    pub items:       Vec<u64>,
    /// Age stamped on the next arrival.  Counts events since the last clear.
    pub clock:       u64,
    capacity:        usize,
    pub(crate) choices: Vec<(u32, u64)>,
}

impl FcfmState {
    /// `capacity` is the run's `max_queue` (at least 1); `max_degree`
    /// pre-sizes the candidate buffer.
    pub fn new(node_count: usize, capacity: usize, max_degree: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue_size:  vec![0; node_count],
            queue_start: vec![0; node_count],
            items:       vec![0; node_count * capacity],
            clock:       0,
            capacity,
            choices:     Vec::with_capacity(max_degree),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Age of the oldest item waiting at `node`.  The queue must be non-empty.
    #[inline]
    pub fn oldest(&self, node: usize) -> u64 {
        debug_assert!(self.queue_size[node] > 0);
        self.items[node * self.capacity + self.queue_start[node] as usize]
    }

    /// Append an item of age `age` to `node`'s queue.  The queue must have
    /// room.
    #[inline]
    pub(crate) fn push(&mut self, node: usize, age: u64) {
        let size = self.queue_size[node] as usize;
        debug_assert!(size < self.capacity);
        let slot = (self.queue_start[node] as usize + size) % self.capacity;
        self.items[node * self.capacity + slot] = age;
        self.queue_size[node] += 1;
    }

    /// Drop the oldest item of `node`.
    #[inline]
    pub(crate) fn pop(&mut self, node: usize) {
        debug_assert!(self.queue_size[node] > 0);
        self.queue_start[node] = ((self.queue_start[node] as usize + 1) % self.capacity) as u32;
        self.queue_size[node] -= 1;
    }

    pub fn clear(&mut self) {
        self.queue_size.fill(0);
        self.queue_start.fill(0);
        self.items.fill(0);
        self.clock = 0;
        self.choices.clear();
    }
}

// ── EngineState ───────────────────────────────────────────────────────────────

/// Policy-specific state held by a `Simulator`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    VirtualQueue(VqState),
    Greedy { selector: Selector, state: GreedyState },
    Fcfm(FcfmState),
}

impl EngineState {
    /// Fresh zeroed state for `policy`.  `max_queue` sizes the FCFM item
    /// buffers.
    pub fn new(policy: Policy, incidence: &Incidence, max_queue: usize) -> Self {
        let n = incidence.node_count();
        let max_degree = || {
            (0..n as u32)
                .map(|i| incidence.node_degree(NodeId(i)))
                .max()
                .unwrap_or(0)
        };
        match policy {
            Policy::VirtualQueue => EngineState::VirtualQueue(VqState::new(n, incidence.edge_count())),
            Policy::Greedy(selector) => {
                EngineState::Greedy { selector, state: GreedyState::new(n, max_degree()) }
            }
            Policy::Fcfm => EngineState::Fcfm(FcfmState::new(n, max_queue, max_degree())),
        }
    }

    pub fn policy(&self) -> Policy {
        match self {
            EngineState::VirtualQueue(_)       => Policy::VirtualQueue,
            EngineState::Greedy { selector, .. } => Policy::Greedy(*selector),
            EngineState::Fcfm(_)               => Policy::Fcfm,
        }
    }

    pub fn queue_size(&self) -> &[u32] {
        match self {
            EngineState::VirtualQueue(s)    => &s.queue_size,
            EngineState::Greedy { state, .. } => &state.queue_size,
            EngineState::Fcfm(s)            => &s.queue_size,
        }
    }

    pub fn clear(&mut self) {
        match self {
            EngineState::VirtualQueue(s)    => s.clear(),
            EngineState::Greedy { state, .. } => state.clear(),
            EngineState::Fcfm(s)            => s.clear(),
        }
    }
}

/// `true` once any queue has reached `max_queue`; no further events can be
/// logged until the state is reset.
#[inline]
pub(crate) fn saturated(queue_size: &[u32], max_queue: usize) -> bool {
    queue_size.iter().any(|&q| q as usize >= max_queue)
}
