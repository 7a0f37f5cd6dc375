//! `sm-sim`: matching engines and simulator driver for the rust_sm framework.
//!
//! Items of several classes (nodes) arrive one at a time, drawn from fixed
//! arrival rates, and wait in per-class queues.  Edges of a hypergraph say
//! which combinations of classes may be matched together; a policy decides
//! which match to perform.
//!
//! # Virtual-queue event loop
//!
//! ```text
//! for event in 0..number_events:
//!   ① Log     : queue_log[j][queue_size[j]] += 1 for every node j.
//!   ② Arrival : node drawn from the alias table.
//!   ③ Push    : queue_size[node] += 1; stop at max_queue.
//!   ④ Scores  : scores of the node's edges += 1; readiness refresh.
//!   ⑤ Commit  : best positive-score edge gets one virtual match.
//!   ⑥ Drain   : up to max_drains_per_event ready edges are served.
//! ```
//!
//! The greedy policies ([`Selector`]) match each arrival immediately when
//! some edge is feasible.  [`FcfmEngine`] does the same but serves the
//! oldest waiting items first.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | [`run_replicas`] runs replicas on Rayon's thread pool. |
//! | `serde`    | `Serialize`/`Deserialize` on policies and reports.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sm_core::{NodeId, SimConfig};
//! use sm_graph::IncidenceBuilder;
//! use sm_sim::{NoopObserver, SimBuilder};
//!
//! let mut g = IncidenceBuilder::new(2);
//! g.add_pair(NodeId(0), NodeId(1));
//! let mut sim = SimBuilder::new(g.build()?, vec![1.0, 1.0])
//!     .config(SimConfig { number_events: 10_000, ..Default::default() })
//!     .seed(42)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! println!("{:?}", sim.average_queues()?);
//! ```

pub mod builder;
pub mod error;
pub mod fcfm;
pub mod greedy;
pub mod observer;
pub mod policy;
pub mod replicas;
pub mod simulator;
pub mod state;
pub mod stats;
pub mod vq;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use fcfm::FcfmEngine;
pub use greedy::{GreedyEngine, Selector};
pub use observer::{NoopObserver, SimObserver};
pub use policy::Policy;
pub use replicas::run_replicas;
pub use simulator::{RunReport, Simulator};
pub use state::{EngineState, FcfmState, GreedyState, Logs, QueueLog, VqState};
pub use vq::VirtualQueueEngine;
