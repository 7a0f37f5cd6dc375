use sm_core::SmError;
use sm_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] SmError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("{what} length {got} does not match node count {expected}")]
    NodeCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("unknown policy `{0}`")]
    UnknownPolicy(String),

    #[error("no simulation steps recorded yet")]
    NoSteps,
}

pub type SimResult<T> = Result<T, SimError>;
