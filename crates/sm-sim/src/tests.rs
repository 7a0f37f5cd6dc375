//! Unit tests for sm-sim.
//!
//! Engine tests drive scripted arrival sequences through `replay` so every
//! intermediate value can be traced by hand; simulator tests use seeded
//! random arrivals.

#[cfg(test)]
mod helpers {
    use sm_core::{AliasTable, NodeId, SimConfig};
    use sm_graph::{Incidence, IncidenceBuilder};

    use crate::{Logs, Policy, SimBuilder, VqState};

    pub const A: NodeId = NodeId(0);
    pub const B: NodeId = NodeId(1);

    /// Two nodes, one edge {0, 1}.
    pub fn pair() -> Incidence {
        let mut b = IncidenceBuilder::new(2);
        b.add_pair(A, B);
        b.build().unwrap()
    }

    /// Three nodes, one hyperedge {0, 1, 2}.
    pub fn triple() -> Incidence {
        let mut b = IncidenceBuilder::new(3);
        b.add_edge(&[NodeId(0), NodeId(1), NodeId(2)]);
        b.build().unwrap()
    }

    /// Two disjoint pairs: edges 0:{0,1} 1:{2,3}.
    pub fn two_pairs() -> Incidence {
        let mut b = IncidenceBuilder::new(4);
        b.add_pair(NodeId(0), NodeId(1));
        b.add_pair(NodeId(2), NodeId(3));
        b.build().unwrap()
    }

    /// Node 0 shared by edges 0:{0,1} and 1:{0,2}.
    pub fn star() -> Incidence {
        let mut b = IncidenceBuilder::new(3);
        b.add_pair(NodeId(0), NodeId(1));
        b.add_pair(NodeId(0), NodeId(2));
        b.build().unwrap()
    }

    /// Diamond with a tail: edges 0:{0,1} 1:{0,2} 2:{1,2} 3:{1,3} 4:{2,3}.
    pub fn bicycle() -> Incidence {
        let mut b = IncidenceBuilder::new(4);
        b.add_pair(NodeId(0), NodeId(1));
        b.add_pair(NodeId(0), NodeId(2));
        b.add_pair(NodeId(1), NodeId(2));
        b.add_pair(NodeId(1), NodeId(3));
        b.add_pair(NodeId(2), NodeId(3));
        b.build().unwrap()
    }

    /// Two triangles joined by the hyperedge {2, 3, 4}.
    pub fn paddle() -> Incidence {
        let n = NodeId;
        let mut b = IncidenceBuilder::new(7);
        b.add_pair(n(0), n(1));
        b.add_pair(n(0), n(2));
        b.add_pair(n(1), n(2));
        b.add_edge(&[n(2), n(3), n(4)]);
        b.add_pair(n(4), n(5));
        b.add_pair(n(4), n(6));
        b.add_pair(n(5), n(6));
        b.build().unwrap()
    }

    pub fn uniform_table(g: &Incidence) -> AliasTable {
        AliasTable::from_rates(&vec![1.0; g.node_count()]).unwrap()
    }

    pub fn vq_parts(g: &Incidence, max_queue: usize) -> (VqState, Logs) {
        (
            VqState::new(g.node_count(), g.edge_count()),
            Logs::new(g.node_count(), g.edge_count(), max_queue),
        )
    }

    pub fn config(number_events: u64, max_queue: u32) -> SimConfig {
        SimConfig { number_events, max_queue, ..Default::default() }
    }

    pub fn builder(g: Incidence, rates: Vec<f64>, policy: Policy) -> SimBuilder {
        SimBuilder::new(g, rates).policy(policy).config(config(2_000, 1_000)).seed(7)
    }

    /// Items still queued plus items consumed by completed matches.
    pub fn items_accounted(g: &Incidence, queue_size: &[u32], logs: &Logs) -> u64 {
        let queued: u64 = queue_size.iter().map(|&q| q as u64).sum();
        let matched: u64 = logs
            .trafic
            .iter()
            .enumerate()
            .map(|(e, &t)| t * g.edge_size(sm_core::EdgeId(e as u32)) as u64)
            .sum();
        queued + matched
    }
}

// ── Virtual-queue engine ──────────────────────────────────────────────────────

#[cfg(test)]
mod vq_engine {
    use sm_core::{AliasTable, NodeId, SimRng};

    use super::helpers::{pair, triple, two_pairs, uniform_table, vq_parts, A, B};
    use crate::vq::select_best_edge;
    use crate::VirtualQueueEngine;

    #[test]
    fn two_node_trace() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = VirtualQueueEngine::new(&t, &g);
        let (mut s, mut logs) = vq_parts(&g, 10);

        // A: committed ahead of B's arrival, not ready.
        assert_eq!(engine.replay(&[A], &mut s, &mut logs), 1);
        assert_eq!(s.queue_size, vec![1, 0]);
        assert_eq!(s.scores, vec![-1]);
        assert_eq!(s.vq, vec![1]);
        assert!(!s.ready_edges[0]);

        // B: edge becomes ready and the pending commitment drains.
        assert_eq!(engine.replay(&[B], &mut s, &mut logs), 2);
        assert_eq!(s.queue_size, vec![0, 0]);
        assert_eq!(s.scores, vec![0]);
        assert_eq!(s.vq, vec![0]);
        assert_eq!(logs.trafic, vec![1]);
        assert!(!s.ready_edges[0]);

        // A again.
        assert_eq!(engine.replay(&[A], &mut s, &mut logs), 3);
        assert_eq!(s.queue_size, vec![1, 0]);
        assert_eq!(s.scores, vec![-1]);
        assert_eq!(s.vq, vec![1]);
        assert_eq!(logs.trafic, vec![1]);
        assert!(!s.ready_edges[0]);

        // Snapshots are taken before each arrival: A saw 0, 1, 0; B saw 0, 0, 0.
        assert_eq!(logs.queue_log.snapshots(), 3);
        assert_eq!(logs.queue_log.get(A, 0), 2);
        assert_eq!(logs.queue_log.get(A, 1), 1);
        assert_eq!(logs.queue_log.get(B, 0), 3);
        assert_eq!(logs.queue_log.row(B).iter().sum::<u64>(), 3);
    }

    #[test]
    fn readiness_tracks_queue_contents() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = VirtualQueueEngine::new(&t, &g);
        let (mut s, mut logs) = vq_parts(&g, 10);

        // A is waiting, nothing committed.
        s.queue_size = vec![1, 0];
        s.scores = vec![-1];

        engine.replay(&[B], &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![1, 1]);
        assert_eq!(s.scores, vec![0]);
        assert!(s.ready_edges[0], "both nodes hold items");
        assert_eq!(logs.trafic, vec![0]);

        engine.replay(&[A], &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![1]);
        assert_eq!(s.queue_size, vec![1, 0]);
        assert!(!s.ready_edges[0], "B emptied");
    }

    #[test]
    fn overflow_stops_before_counting() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = VirtualQueueEngine::new(&t, &g);
        let (mut s, mut logs) = vq_parts(&g, 2);

        // Second A fills the queue to max_queue.
        assert_eq!(engine.replay(&[A, A, A], &mut s, &mut logs), 1);
        assert_eq!(logs.steps_done, 1);
        assert_eq!(s.queue_size, vec![2, 0]);
        // The overflowing event is still logged.
        assert_eq!(logs.queue_log.snapshots(), 2);

        // Saturated: nothing further happens.
        assert_eq!(engine.replay(&[B], &mut s, &mut logs), 1);
        assert_eq!(logs.queue_log.snapshots(), 2);
    }

    #[test]
    fn random_run_overflow_returns_short_count() {
        let g = pair();
        let t = AliasTable::from_rates(&[1.0, 0.0]).unwrap();
        let engine = VirtualQueueEngine::new(&t, &g);
        let (mut s, mut logs) = vq_parts(&g, 2);
        let mut rng = SimRng::new(1);

        assert_eq!(engine.run(2, None, &mut rng, &mut s, &mut logs), 1);
    }

    #[test]
    fn single_edge_score_returns_to_zero_each_round() {
        let g = triple();
        let t = uniform_table(&g);
        let engine = VirtualQueueEngine::new(&t, &g);
        let (mut s, mut logs) = vq_parts(&g, 10);
        let round = [NodeId(0), NodeId(1), NodeId(2)];

        engine.replay(&round[..1], &mut s, &mut logs);
        // +1 for the arrival, -3 for the commitment (one per shared node).
        assert_eq!(s.scores, vec![-2]);
        assert_eq!(s.vq, vec![1]);

        engine.replay(&round[1..2], &mut s, &mut logs);
        assert_eq!(s.scores, vec![-1]);
        assert!(!s.ready_edges[0]);

        engine.replay(&round[2..], &mut s, &mut logs);
        assert_eq!(s.scores, vec![0]);
        assert_eq!(s.vq, vec![0]);
        assert_eq!(s.queue_size, vec![0, 0, 0]);
        assert_eq!(logs.trafic, vec![1]);

        for k in 2..=5 {
            engine.replay(&round, &mut s, &mut logs);
            assert_eq!(s.scores, vec![0]);
            assert_eq!(logs.trafic, vec![k]);
        }
    }

    /// Both edges ready with pending commitments; an arrival at node 0.
    fn two_ready_edges(max_drains: u32) -> Vec<u64> {
        let g = two_pairs();
        let t = uniform_table(&g);
        let engine = VirtualQueueEngine::new(&t, &g).with_max_drains(max_drains);
        let (mut s, mut logs) = vq_parts(&g, 10);
        s.queue_size = vec![1, 1, 1, 1];
        s.ready_edges = vec![true, true];
        s.vq = vec![1, 1];

        engine.replay(&[NodeId(0)], &mut s, &mut logs);
        logs.trafic
    }

    #[test]
    fn one_drain_per_event_by_default() {
        assert_eq!(two_ready_edges(1), vec![1, 0]);
    }

    #[test]
    fn extra_drains_when_allowed() {
        assert_eq!(two_ready_edges(2), vec![1, 1]);
    }

    #[test]
    fn zero_drain_limit_clamped_to_one() {
        assert_eq!(two_ready_edges(0), vec![1, 0]);
    }

    #[test]
    fn best_edge_lowest_index_on_ties() {
        assert_eq!(select_best_edge(&[1, 3, 3, 2]), Some(sm_core::EdgeId(1)));
        assert_eq!(select_best_edge(&[0, -1, 0]), None);
        assert_eq!(select_best_edge(&[]), None);
    }

    #[test]
    fn seeded_runs_repeat() {
        let g = two_pairs();
        let t = uniform_table(&g);
        let engine = VirtualQueueEngine::new(&t, &g);
        let mut rng = SimRng::new(0);

        let (mut s1, mut l1) = vq_parts(&g, 100);
        let (mut s2, mut l2) = vq_parts(&g, 100);
        engine.run(500, Some(42), &mut rng, &mut s1, &mut l1);
        engine.run(500, Some(42), &mut rng, &mut s2, &mut l2);
        assert_eq!(s1, s2);
        assert_eq!(l1, l2);
    }
}

// ── Greedy engine ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod greedy_engine {
    use sm_core::{NodeId, SimRng};

    use super::helpers::{pair, star, triple, uniform_table, A, B};
    use crate::{GreedyEngine, GreedyState, Logs, Selector};

    fn parts(g: &sm_graph::Incidence, max_queue: usize) -> (GreedyState, Logs) {
        (
            GreedyState::new(g.node_count(), 4),
            Logs::new(g.node_count(), g.edge_count(), max_queue),
        )
    }

    #[test]
    fn pair_matches_immediately() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = GreedyEngine::new(&t, &g, Selector::RandomNode);
        let (mut s, mut logs) = parts(&g, 10);
        let mut rng = SimRng::new(0);

        engine.replay(&[A], &mut rng, &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![1, 0]);
        engine.replay(&[A], &mut rng, &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![2, 0]);
        engine.replay(&[B], &mut rng, &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![1, 0]);
        assert_eq!(logs.trafic, vec![1]);
        assert_eq!(logs.steps_done, 3);
    }

    #[test]
    fn hyperedge_needs_every_other_node() {
        let g = triple();
        let t = uniform_table(&g);
        let engine = GreedyEngine::new(&t, &g, Selector::LongestQueue);
        let (mut s, mut logs) = parts(&g, 10);
        let mut rng = SimRng::new(0);

        engine.replay(&[NodeId(0), NodeId(1)], &mut rng, &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![1, 1, 0]);
        assert_eq!(logs.trafic, vec![0]);

        engine.replay(&[NodeId(2)], &mut rng, &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![0, 0, 0]);
        assert_eq!(logs.trafic, vec![1]);
    }

    #[test]
    fn longest_queue_picks_heaviest_then_first() {
        let g = star();
        let t = uniform_table(&g);
        let engine = GreedyEngine::new(&t, &g, Selector::LongestQueue);
        let mut rng = SimRng::new(0);

        let (mut s, mut logs) = parts(&g, 10);
        s.queue_size = vec![0, 1, 3];
        engine.replay(&[NodeId(0)], &mut rng, &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![0, 1]);
        assert_eq!(s.queue_size, vec![0, 1, 2]);

        let (mut s, mut logs) = parts(&g, 10);
        s.queue_size = vec![0, 2, 2];
        engine.replay(&[NodeId(0)], &mut rng, &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![1, 0]);
    }

    /// Share of arrivals at the centre that pick edge 1 when the leaves hold
    /// 1 and 3 items.
    fn share_of_heavy_edge(selector: Selector) -> f64 {
        let g = star();
        let t = uniform_table(&g);
        let engine = GreedyEngine::new(&t, &g, selector);
        let mut rng = SimRng::new(99);
        let (mut s, mut logs) = parts(&g, 10);
        const TRIALS: u64 = 20_000;
        for _ in 0..TRIALS {
            s.queue_size.copy_from_slice(&[0, 1, 3]);
            engine.replay(&[NodeId(0)], &mut rng, &mut s, &mut logs);
        }
        logs.trafic[1] as f64 / TRIALS as f64
    }

    #[test]
    fn random_item_weights_by_queue() {
        let p = share_of_heavy_edge(Selector::RandomItem);
        assert!((p - 0.75).abs() < 0.02, "p = {p}");
    }

    #[test]
    fn random_node_is_uniform() {
        let p = share_of_heavy_edge(Selector::RandomNode);
        assert!((p - 0.5).abs() < 0.02, "p = {p}");
    }

    #[test]
    fn overflow_on_push() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = GreedyEngine::new(&t, &g, Selector::RandomNode);
        let (mut s, mut logs) = parts(&g, 2);
        let mut rng = SimRng::new(0);

        assert_eq!(engine.replay(&[A, A, A], &mut rng, &mut s, &mut logs), 1);
        assert_eq!(s.queue_size, vec![2, 0]);
        assert_eq!(engine.replay(&[B], &mut rng, &mut s, &mut logs), 1);
    }

    #[test]
    fn overflow_on_first_wait_with_unit_max_queue() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = GreedyEngine::new(&t, &g, Selector::RandomNode);
        let (mut s, mut logs) = parts(&g, 1);
        let mut rng = SimRng::new(0);

        assert_eq!(engine.replay(&[A], &mut rng, &mut s, &mut logs), 0);
        assert_eq!(logs.queue_log.snapshots(), 1);
    }
}

// ── FCFM engine ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod fcfm_engine {
    use sm_core::{AliasTable, NodeId, SimRng};
    use sm_graph::{Incidence, IncidenceBuilder};

    use super::helpers::{pair, star, uniform_table, A, B};
    use crate::{FcfmEngine, FcfmState, Logs};

    fn parts(g: &Incidence, max_queue: usize) -> (FcfmState, Logs) {
        (
            FcfmState::new(g.node_count(), max_queue, 4),
            Logs::new(g.node_count(), g.edge_count(), max_queue),
        )
    }

    #[test]
    fn oldest_neighbour_wins_on_star() {
        let g = star();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 10);

        // Leaf 2 waits first (age 0), then leaf 1 (age 1).
        engine.replay(&[NodeId(2), NodeId(1)], &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![0, 1, 1]);

        // The centre goes to edge 1 even though edge 0 comes first.
        engine.replay(&[NodeId(0)], &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![0, 1]);
        assert_eq!(s.queue_size, vec![0, 1, 0]);

        engine.replay(&[NodeId(0)], &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![1, 1]);
        assert_eq!(s.queue_size, vec![0, 0, 0]);
        assert_eq!(logs.steps_done, 4);
        assert_eq!(s.clock, 4);
    }

    #[test]
    fn ties_go_to_first_edge() {
        let g = star();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 10);

        s.queue_size = vec![0, 1, 1];
        engine.replay(&[NodeId(0)], &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![1, 0]);
    }

    #[test]
    fn ring_buffer_wraps_in_arrival_order() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 3);

        engine.replay(&[A, A, B], &mut s, &mut logs);
        assert_eq!(s.queue_size, vec![1, 0]);
        assert_eq!(s.oldest(0), 1);

        engine.replay(&[A, B], &mut s, &mut logs);
        assert_eq!(s.oldest(0), 3);

        // Age 5 lands in slot 0 after the wrap.
        engine.replay(&[A, B], &mut s, &mut logs);
        assert_eq!(s.queue_start, vec![0, 0]);
        assert_eq!(s.oldest(0), 5);
        assert_eq!(logs.trafic, vec![3]);
    }

    /// Edges 0:{0,1,2} and 1:{0,3}.
    fn hyper_and_pair() -> Incidence {
        let mut b = IncidenceBuilder::new(4);
        b.add_edge(&[NodeId(0), NodeId(1), NodeId(2)]);
        b.add_pair(NodeId(0), NodeId(3));
        b.build().unwrap()
    }

    fn served_edge(arrivals: &[NodeId]) -> Vec<u64> {
        let g = hyper_and_pair();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 10);
        engine.replay(arrivals, &mut s, &mut logs);
        logs.trafic
    }

    #[test]
    fn hyperedge_age_is_its_oldest_member() {
        let n = NodeId;
        // Node 1 is the oldest item overall, so the hyperedge wins.
        assert_eq!(served_edge(&[n(1), n(3), n(2), n(0)]), vec![1, 0]);
        // Node 3 is older than both hyperedge members.
        assert_eq!(served_edge(&[n(3), n(1), n(2), n(0)]), vec![0, 1]);
        // Hyperedge incomplete: only the pair is feasible.
        assert_eq!(served_edge(&[n(1), n(3), n(0)]), vec![0, 1]);
    }

    #[test]
    fn singleton_edge_only_when_nothing_else() {
        let mut b = IncidenceBuilder::new(2);
        b.add_edge(&[NodeId(0)]);
        b.add_pair(NodeId(0), NodeId(1));
        let g = b.build().unwrap();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 10);

        engine.replay(&[NodeId(1), NodeId(0)], &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![0, 1]);

        engine.replay(&[NodeId(0)], &mut s, &mut logs);
        assert_eq!(logs.trafic, vec![1, 1]);
        assert_eq!(s.queue_size, vec![0, 0]);
    }

    #[test]
    fn overflow_on_push() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 2);

        assert_eq!(engine.replay(&[A, A, A], &mut s, &mut logs), 1);
        assert_eq!(s.queue_size, vec![2, 0]);
        assert_eq!(logs.queue_log.snapshots(), 2);
        assert_eq!(engine.replay(&[B], &mut s, &mut logs), 1);
    }

    #[test]
    fn overflow_on_first_wait_with_unit_max_queue() {
        let g = pair();
        let t = uniform_table(&g);
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 1);

        assert_eq!(engine.replay(&[A], &mut s, &mut logs), 0);
        assert_eq!(logs.queue_log.snapshots(), 1);
    }

    #[test]
    fn random_run_clock_follows_events() {
        let g = star();
        let t = AliasTable::from_rates(&[2.0, 1.0, 1.0]).unwrap();
        let engine = FcfmEngine::new(&t, &g);
        let (mut s, mut logs) = parts(&g, 1_000);
        let mut rng = SimRng::new(5);

        assert_eq!(engine.run(300, None, &mut rng, &mut s, &mut logs), 300);
        assert_eq!(engine.run(200, None, &mut rng, &mut s, &mut logs), 500);
        assert_eq!(s.clock, 500);

        s.clear();
        assert_eq!(s.clock, 0);
        assert_eq!(s.queue_size, vec![0, 0, 0]);
    }
}

// ── Policy ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod policy {
    use crate::{Policy, Selector, SimError};

    #[test]
    fn names_roundtrip() {
        for p in Policy::ALL {
            assert_eq!(p.to_string().parse::<Policy>().unwrap(), p);
        }
        assert_eq!("longest_queue".parse::<Policy>().unwrap(), Policy::Greedy(Selector::LongestQueue));
    }

    #[test]
    fn unknown_name() {
        let err = "fifo".parse::<Policy>().unwrap_err();
        assert!(matches!(err, SimError::UnknownPolicy(ref s) if s == "fifo"));
    }

    #[test]
    fn fcfm_is_listed() {
        assert_eq!("fcfm".parse::<Policy>().unwrap(), Policy::Fcfm);
        assert_eq!(Policy::ALL.len(), 5);
    }

    #[test]
    fn default_is_virtual_queue() {
        assert_eq!(Policy::default(), Policy::VirtualQueue);
        assert_eq!(Policy::default().name(), "virtual_queue");
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stats {
    use crate::{stats, Logs, SimError};

    /// Node 0 sees sizes 0, 1, 2, 1; node 1 sees 0, 0, 1, 1.
    fn logs() -> Logs {
        let mut logs = Logs::new(2, 1, 3);
        for q in [[0u32, 0], [1, 0], [2, 1], [1, 1]] {
            logs.queue_log.record(&q);
        }
        logs.steps_done = 4;
        logs.trafic = vec![2];
        logs
    }

    #[test]
    fn average_queues() {
        assert_eq!(stats::average_queues(&logs()).unwrap(), vec![1.0, 0.5]);
    }

    #[test]
    fn ccdf_rows() {
        let c = stats::ccdf(&logs()).unwrap();
        assert_eq!(c[0], vec![1.0, 0.75, 0.25, 0.0]);
        assert_eq!(c[1], vec![1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn waiting_times() {
        let rates = [1.0, 0.5];
        assert_eq!(stats::total_waiting_time(&logs(), &rates).unwrap(), 1.0);
        assert_eq!(stats::average_waiting_times(&logs(), &rates).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn traffic_rates() {
        assert_eq!(stats::traffic_rates(&logs()).unwrap(), vec![0.5]);
    }

    #[test]
    fn empty_logs_have_no_steps() {
        let logs = Logs::new(2, 1, 3);
        assert!(matches!(stats::average_queues(&logs), Err(SimError::NoSteps)));
        assert!(matches!(stats::ccdf(&logs), Err(SimError::NoSteps)));
        assert!(matches!(stats::traffic_rates(&logs), Err(SimError::NoSteps)));
    }

    #[test]
    fn zero_max_queue_keeps_empty_bucket() {
        let mut logs = Logs::new(2, 1, 0);
        assert_eq!(logs.queue_log.max_queue(), 1);
        logs.queue_log.record(&[0, 0]);
        assert_eq!(logs.queue_log.snapshots(), 1);
        assert_eq!(logs.queue_log.node_count(), 2);
        assert_eq!(stats::average_queues(&logs).unwrap(), vec![0.0, 0.0]);
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use sm_core::{AliasTable, SmError};
    use sm_graph::IncidenceBuilder;

    use super::helpers::{config, pair};
    use crate::{Policy, SimBuilder, SimError};

    #[test]
    fn rejects_rate_count_mismatch() {
        let err = SimBuilder::new(pair(), vec![1.0]).build().unwrap_err();
        assert!(matches!(err, SimError::NodeCountMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn rejects_empty_graph() {
        let g = IncidenceBuilder::new(0).build().unwrap();
        assert!(matches!(SimBuilder::new(g, vec![]).build(), Err(SimError::EmptyGraph)));
    }

    #[test]
    fn rejects_invalid_rates() {
        let err = SimBuilder::new(pair(), vec![1.0, -1.0]).build().unwrap_err();
        assert!(matches!(err, SimError::Core(SmError::InvalidRates(_))));
    }

    #[test]
    fn rejects_invalid_config() {
        let err = SimBuilder::new(pair(), vec![1.0, 1.0]).config(config(10, 0)).build().unwrap_err();
        assert!(matches!(err, SimError::Core(SmError::Config(_))));
    }

    #[test]
    fn rejects_wrong_size_alias_table() {
        let t = AliasTable::from_rates(&[1.0, 1.0, 1.0]).unwrap();
        let err = SimBuilder::new(pair(), vec![1.0, 1.0]).alias_table(t).build().unwrap_err();
        assert!(matches!(err, SimError::NodeCountMismatch { what: "alias table", .. }));
    }

    #[test]
    fn builds_requested_policy() {
        for p in Policy::ALL {
            let sim = SimBuilder::new(pair(), vec![1.0, 1.0]).policy(p).build().unwrap();
            assert_eq!(sim.policy(), p);
            assert_eq!(sim.queue_size(), &[0, 0]);
            assert_eq!(sim.steps_done(), 0);
        }
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod simulator {
    use super::helpers::{bicycle, builder, config, items_accounted, pair, paddle};
    use crate::{run_replicas, NoopObserver, Policy, RunReport, SimBuilder, SimObserver};

    const PADDLE_RATES: [f64; 7] = [1.0, 1.0, 1.5, 1.0, 1.5, 1.0, 1.0];

    #[derive(Default)]
    struct Counts {
        starts:    u32,
        ends:      u32,
        overflows: u32,
        last:      Option<RunReport>,
    }

    impl SimObserver for Counts {
        fn on_batch_start(&mut self, _steps_done: u64, _requested: u64) {
            self.starts += 1;
        }
        fn on_batch_end(&mut self, report: &RunReport) {
            self.ends += 1;
            self.last = Some(*report);
        }
        fn on_overflow(&mut self, _steps_done: u64) {
            self.overflows += 1;
        }
    }

    #[test]
    fn full_run_reports_every_event() {
        for p in Policy::ALL {
            let mut sim = builder(bicycle(), vec![1.0; 4], p).build().unwrap();
            let mut obs = Counts::default();
            let report = sim.run(&mut obs).unwrap();
            assert_eq!(report, RunReport { requested: 2_000, completed: 2_000, steps_done: 2_000, overflowed: false });
            assert_eq!((obs.starts, obs.ends, obs.overflows), (1, 1, 0));
            assert_eq!(obs.last, Some(report));
            assert_eq!(sim.logs().queue_log.snapshots(), 2_000);
        }
    }

    #[test]
    fn items_are_conserved() {
        for p in Policy::ALL {
            let g = paddle();
            let mut sim = builder(g.clone(), PADDLE_RATES.to_vec(), p).build().unwrap();
            for _ in 0..20 {
                sim.run_events(50, &mut NoopObserver).unwrap();
                assert_eq!(items_accounted(&g, sim.queue_size(), sim.logs()), sim.steps_done(), "{p}");
            }
        }
    }

    #[test]
    fn overflow_halts_and_saturates() {
        let mut sim = SimBuilder::new(pair(), vec![1.0, 0.0]).config(config(2, 2)).seed(3).build().unwrap();
        let mut obs = Counts::default();

        let report = sim.run(&mut obs).unwrap();
        assert_eq!(report.completed, 1);
        assert!(report.overflowed);
        assert_eq!(obs.overflows, 1);
        assert!(sim.is_saturated());

        let again = sim.run(&mut obs).unwrap();
        assert_eq!(again.completed, 0);
        assert_eq!(again.steps_done, 1);

        sim.reset();
        assert!(!sim.is_saturated());
        assert_eq!(sim.steps_done(), 0);
        assert_eq!(sim.run(&mut obs).unwrap().completed, 1);
    }

    #[test]
    fn same_seed_same_logs() {
        for p in Policy::ALL {
            let mut a = builder(paddle(), PADDLE_RATES.to_vec(), p).build().unwrap();
            let mut b = builder(paddle(), PADDLE_RATES.to_vec(), p).build().unwrap();
            a.run(&mut NoopObserver).unwrap();
            b.run(&mut NoopObserver).unwrap();
            assert_eq!(a.logs(), b.logs());
            assert_eq!(a.state(), b.state());
        }
    }

    #[test]
    fn reset_rewinds_seed() {
        let mut sim = builder(paddle(), PADDLE_RATES.to_vec(), Policy::VirtualQueue).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();
        let first = sim.logs().clone();

        sim.reset();
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.logs(), &first);
    }

    #[test]
    fn batches_continue_the_stream() {
        let b = builder(bicycle(), vec![1.0, 2.0, 1.0, 2.0], Policy::VirtualQueue);
        let mut split = b.clone().build().unwrap();
        let mut whole = b.build().unwrap();

        split.run_events(300, &mut NoopObserver).unwrap();
        split.run_events(700, &mut NoopObserver).unwrap();
        whole.run_events(1_000, &mut NoopObserver).unwrap();
        assert_eq!(split.logs(), whole.logs());
        assert_eq!(split.state(), whole.state());
    }

    #[test]
    fn reset_logs_keeps_queues() {
        let mut sim = builder(paddle(), PADDLE_RATES.to_vec(), Policy::VirtualQueue).build().unwrap();
        sim.run_events(500, &mut NoopObserver).unwrap();
        let queues = sim.queue_size().to_vec();
        sim.reset_logs();
        assert_eq!(sim.queue_size(), &queues[..]);
        assert_eq!(sim.steps_done(), 0);
        assert!(sim.average_queues().is_err());
    }

    #[test]
    fn statistics_are_consistent() {
        let mut sim = builder(paddle(), PADDLE_RATES.to_vec(), Policy::VirtualQueue).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let avg = sim.average_queues().unwrap();
        let total = sim.total_waiting_time().unwrap();
        assert_eq!(avg.len(), 7);
        assert!(avg.iter().all(|&q| q >= 0.0));
        let expected = avg.iter().sum::<f64>() / PADDLE_RATES.iter().sum::<f64>();
        assert!((total - expected).abs() < 1e-12);

        for row in sim.ccdf().unwrap() {
            assert_eq!(row.len(), 1_001);
            assert_eq!(row[0], 1.0);
            assert!(row.windows(2).all(|w| w[0] >= w[1]));
            assert!(row[1_000].abs() < 1e-12);
        }

        let rates = sim.traffic_rates().unwrap();
        let matched: f64 = rates.iter().sum::<f64>() * sim.steps_done() as f64;
        assert!((matched - sim.logs().total_trafic() as f64).abs() < 1e-6);
    }

    #[test]
    fn replicas_follow_their_seed() {
        let b = builder(bicycle(), vec![1.0; 4], Policy::VirtualQueue);
        let sims = run_replicas(&b, &[1, 2, 1]).unwrap();
        assert_eq!(sims.len(), 3);
        assert_eq!(sims[0].logs(), sims[2].logs());
        assert_eq!(sims[0].steps_done(), 2_000);
        assert_eq!(sims[1].config().seed, Some(2));
    }
}
