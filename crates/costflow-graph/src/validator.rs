//! DAG integrity checks over a [`GraphSnapshot`].
//!
//! The validator is deliberately separate from snapshot construction:
//! construction tolerates dangling edges by dropping them (see
//! [`crate::snapshot::GraphSnapshot::build`]), but the allocation engine
//! still wants to know, before it runs a day's computation, whether the
//! graph it was handed was well-formed — so the validator re-examines
//! those drops as fatal errors.

use costflow_core::{EdgeId, NodeId};

use crate::snapshot::{DropReason, GraphSnapshot};

/// A fatal validation problem. A snapshot with any error is not safe to
/// allocate over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The graph contains a cycle.
    CycleDetected,
    /// An edge has `parent_id == child_id`.
    SelfLoop(EdgeId),
    /// An edge referenced a parent node outside the snapshot.
    MissingParentNode(EdgeId, NodeId),
    /// An edge referenced a child node outside the snapshot.
    MissingChildNode(EdgeId, NodeId),
}

/// A non-fatal validation observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// More than one active edge exists between the same `(parent, child)`
    /// pair on this date.
    MultipleActiveEdges(NodeId, NodeId),
    /// A node has neither incoming nor outgoing edges.
    IsolatedNode(NodeId),
    /// A node is marked `is_platform` yet has outgoing edges.
    PlatformWithChildren(NodeId),
}

/// Summary counters produced alongside a validation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    /// Total nodes examined.
    pub node_count: usize,
    /// Total edges examined (after dangling-reference drops).
    pub edge_count: usize,
    /// Number of fatal errors found.
    pub error_count: usize,
    /// Number of non-fatal warnings found.
    pub warning_count: usize,
}

/// The result of validating a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// Fatal problems.
    pub errors: Vec<ValidationError>,
    /// Non-fatal observations.
    pub warnings: Vec<ValidationWarning>,
    /// Summary counters.
    pub stats: ValidationStats,
}

/// Validates a graph snapshot's structural integrity.
pub struct Validator;

impl Validator {
    /// Runs every check against `snapshot` and returns a combined report.
    #[must_use]
    pub fn validate(snapshot: &GraphSnapshot) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for dropped in snapshot.dropped_edges() {
            match &dropped.reason {
                DropReason::MissingParent(node) => {
                    errors.push(ValidationError::MissingParentNode(dropped.edge_id, *node));
                }
                DropReason::MissingChild(node) => {
                    errors.push(ValidationError::MissingChildNode(dropped.edge_id, *node));
                }
            }
        }

        for node_id in snapshot.node_ids() {
            for edge_id in snapshot.edges_from(node_id) {
                if let Some(edge) = snapshot.edge(*edge_id) {
                    if edge.parent_id == edge.child_id {
                        errors.push(ValidationError::SelfLoop(*edge_id));
                    }
                }
            }
        }

        if snapshot.topological_order().is_err() {
            errors.push(ValidationError::CycleDetected);
        }

        for node_id in snapshot.node_ids() {
            let mut by_child: std::collections::BTreeMap<NodeId, usize> =
                std::collections::BTreeMap::new();
            for edge_id in snapshot.edges_from(node_id) {
                if let Some(edge) = snapshot.edge(*edge_id) {
                    *by_child.entry(edge.child_id).or_default() += 1;
                }
            }
            for (child_id, count) in by_child {
                if count > 1 {
                    warnings.push(ValidationWarning::MultipleActiveEdges(node_id, child_id));
                }
            }

            if snapshot.edges_from(node_id).is_empty() && snapshot.edges_into(node_id).is_empty() {
                warnings.push(ValidationWarning::IsolatedNode(node_id));
            }

            if let Some(node) = snapshot.node(node_id) {
                if node.is_platform && !snapshot.edges_from(node_id).is_empty() {
                    warnings.push(ValidationWarning::PlatformWithChildren(node_id));
                }
            }
        }

        let stats = ValidationStats {
            node_count: snapshot.node_count(),
            edge_count: snapshot.edge_count(),
            error_count: errors.len(),
            warning_count: warnings.len(),
        };

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            stats,
        }
    }
}
