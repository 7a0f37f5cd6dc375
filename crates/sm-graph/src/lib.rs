//! `sm-graph`: the node↔edge incidence index.
//!
//! # Crate layout
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`incidence`] | `Incidence` (paired CSR views), `IncidenceBuilder`    |
//! | [`error`]     | `GraphError`, `GraphResult<T>`                        |
//!
//! Works for simple graphs (every edge joins two nodes) and hypergraphs
//! (edges of any non-zero size) alike.

pub mod error;
pub mod incidence;


pub use error::{GraphError, GraphResult};
pub use incidence::{Incidence, IncidenceBuilder};
