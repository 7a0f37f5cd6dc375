//! `sm-core`: foundational types for the `rust_sm` matching simulator.
//!
//! This crate is a dependency of every other `sm-*` crate.  It has no `sm-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`                                    |
//! | [`rng`]     | `SimRng` (caller-owned generator)                     |
//! | [`alias`]   | `AliasTable` (O(1) weighted node draws)               |
//! | [`config`]  | `SimConfig`                                           |
//! | [`error`]   | `SmError`, `SmResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `SimConfig`.     |

pub mod alias;
pub mod config;
pub mod error;
pub mod ids;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use alias::AliasTable;
pub use config::SimConfig;
pub use error::{SmError, SmResult};
pub use ids::{EdgeId, NodeId};
pub use rng::SimRng;
