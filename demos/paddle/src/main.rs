//! paddle: compare matching policies on a small hypergraph.
//!
//! Two triangles {0,1,2} and {4,5,6} joined by the hyperedge {2,3,4}.  The
//! hub nodes 2 and 4 arrive faster than the rest, so the hyperedge competes
//! with both triangles for their items.
//!
//! Usage: `paddle [policy]` where `policy` is one of `virtual_queue`,
//! `random_node`, `longest_queue`, `random_item`, `fcfm`.  Without an
//! argument all policies run.  Set `RUST_LOG=debug` to see per-batch logging.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use sm_core::{NodeId, SimConfig};
use sm_graph::{Incidence, IncidenceBuilder};
use sm_sim::{NoopObserver, Policy, SimBuilder};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:          u64   = 42;
const NUMBER_EVENTS: u64   = 10_000_000;
const MAX_QUEUE:     u32   = 1_000;
const RATES:         [f64; 7] = [1.0, 1.0, 1.5, 1.0, 1.5, 1.0, 1.0];

// ── Graph ─────────────────────────────────────────────────────────────────────

fn build_paddle() -> Result<Incidence> {
    let n = NodeId;
    let mut b = IncidenceBuilder::with_capacity(7, 7);
    b.add_pair(n(0), n(1));
    b.add_pair(n(0), n(2));
    b.add_pair(n(1), n(2));
    b.add_edge(&[n(2), n(3), n(4)]);
    b.add_pair(n(4), n(5));
    b.add_pair(n(4), n(6));
    b.add_pair(n(5), n(6));
    Ok(b.build()?)
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn fmt_row(values: &[f64]) -> String {
    values.iter().map(|v| format!("{v:6.3}")).collect::<Vec<_>>().join(" ")
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging("info");

    let policies: Vec<Policy> = match std::env::args().nth(1) {
        Some(name) => vec![name.parse().with_context(|| format!("parsing policy `{name}`"))?],
        None       => Policy::ALL.to_vec(),
    };

    let incidence = build_paddle()?;
    println!("=== paddle: stochastic matching ===");
    println!(
        "Nodes: {}  |  Edges: {}  |  Events: {NUMBER_EVENTS}  |  Seed: {SEED}",
        incidence.node_count(),
        incidence.edge_count()
    );
    println!("Rates: {}", fmt_row(&RATES));
    println!();

    let config = SimConfig {
        number_events: NUMBER_EVENTS,
        max_queue:     MAX_QUEUE,
        seed:          Some(SEED),
        ..Default::default()
    };

    for policy in policies {
        let mut sim = SimBuilder::new(incidence.clone(), RATES.to_vec())
            .config(config.clone())
            .policy(policy)
            .build()?;

        let t0 = Instant::now();
        let report = sim.run(&mut NoopObserver)?;
        let elapsed = t0.elapsed();
        info!(%policy, steps = report.steps_done, ?elapsed, "run finished");

        println!("── {policy} ──");
        if report.overflowed {
            println!("  overflow after {} events", report.steps_done);
        }
        println!("  traffic       {}", fmt_row(&sim.traffic_rates()?));
        println!("  avg queues    {}", fmt_row(&sim.average_queues()?));
        println!("  waiting time  {:.4}", sim.total_waiting_time()?);
        println!(
            "  throughput    {:.1} M events/s",
            report.completed as f64 / elapsed.as_secs_f64() / 1e6
        );
        println!();
    }

    Ok(())
}
