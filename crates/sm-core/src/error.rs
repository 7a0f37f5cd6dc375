//! Core error type.
//!
//! `sm-graph` and `sm-sim` define their own enums and wrap `SmError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// Errors raised while validating rates, sampler tables, or configuration.
#[derive(Debug, Error)]
pub enum SmError {
    #[error("invalid arrival rates: {0}")]
    InvalidRates(String),

    #[error("invalid alias table: {0}")]
    InvalidAliasTable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `sm-core`.
pub type SmResult<T> = Result<T, SmError>;
