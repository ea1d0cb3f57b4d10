//! Errors produced while building or traversing a graph snapshot.

use costflow_core::NodeId;
use thiserror::Error;

/// Errors produced while building or traversing a [`crate::snapshot::GraphSnapshot`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains a cycle; no valid topological order exists.
    #[error("graph contains a cycle")]
    CycleDetected,

    /// An edge has `parent_id == child_id`.
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),

    /// An edge references a parent node not present in the snapshot.
    #[error("edge references missing parent node {0}")]
    MissingParentNode(NodeId),

    /// An edge references a child node not present in the snapshot.
    #[error("edge references missing child node {0}")]
    MissingChildNode(NodeId),

    /// A query referenced a node id not present in the snapshot.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Convenience alias for graph operation results.
pub type GraphResult<T> = Result<T, GraphError>;
