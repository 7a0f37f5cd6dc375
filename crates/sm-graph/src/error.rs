//! Incidence-index error type.

use thiserror::Error;

use sm_core::{EdgeId, NodeId};

/// Errors produced while building or validating an [`Incidence`](crate::Incidence).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{edge} references {node}, but the graph has {node_count} nodes")]
    NodeOutOfRange { edge: EdgeId, node: NodeId, node_count: usize },

    #[error("{node} references {edge}, but the graph has {edge_count} edges")]
    EdgeOutOfRange { node: NodeId, edge: EdgeId, edge_count: usize },

    #[error("{0} covers no nodes")]
    EmptyEdge(EdgeId),

    #[error("{edge} lists {node} more than once")]
    DuplicateNode { edge: EdgeId, node: NodeId },

    #[error("malformed CSR block `{what}`: {reason}")]
    MalformedCsr { what: &'static str, reason: String },

    #[error("node→edge and edge→node views disagree on {0}")]
    Inconsistent(EdgeId),
}

pub type GraphResult<T> = Result<T, GraphError>;
