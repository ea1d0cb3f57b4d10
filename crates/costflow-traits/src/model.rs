//! Persisted entity shapes consumed and produced by the allocation engine.
//!
//! These are plain data — no behavior — mirroring what the repository
//! layer reads and writes. Strategy selection and evaluation are left to
//! `costflow-strategy`; a [`StrategySpec`] here is the un-interpreted,
//! persisted `(name, params)` pair it knows how to parse.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use costflow_core::{CostDate, Currency, Dimension, EdgeId, Metric, NodeId, OverrideId, RunId};

/// The kind of entity a node represents in the cost dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// A customer-facing business product; the usual final cost centre.
    Product,
    /// A concrete infrastructure resource (a VM, a bucket, a queue, ...).
    Resource,
    /// A service shared by multiple products (a shared database, a shared
    /// queue, ...).
    Shared,
    /// An internal platform team or capability.
    Platform,
    /// Base infrastructure (compute, network, storage primitives).
    Infrastructure,
    /// An internal or third-party service consumed by other nodes.
    Service,
}

/// A string-keyed label map attached to nodes and usage samples.
pub type Labels = BTreeMap<String, String>;

/// A node in the cost dependency graph: a product, resource, shared
/// service, platform, or infrastructure component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Opaque identifier.
    pub id: NodeId,
    /// Unique human-readable name.
    pub name: String,
    /// The kind of entity this node represents.
    pub node_type: NodeType,
    /// Whether this node is a platform team/capability, independent of
    /// `node_type` (a modeling smell if `true` and the node has outgoing
    /// edges — see the validator's `PlatformWithChildren` warning).
    pub is_platform: bool,
    /// Free-form labels.
    pub labels: Labels,
    /// Opaque metadata blob, not interpreted by the engine.
    pub metadata: JsonValue,
    /// Set when the node has been archived. Archived nodes are excluded
    /// from graph snapshots but never deleted.
    pub archived_at: Option<DateTime<Utc>>,
}

impl Node {
    /// Returns `true` if this node should be excluded from graph snapshots.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// An un-interpreted `(strategy name, params)` pair, as persisted on an
/// edge or an edge strategy override.
///
/// `costflow-strategy` owns the closed set of recognized strategy names
/// and their parameter shapes; this type only carries the data across the
/// repository boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySpec {
    /// The strategy name, e.g. `"equal"` or `"proportional_on"`.
    pub strategy: String,
    /// Strategy-specific parameters, as a JSON object.
    pub params: JsonValue,
}

impl StrategySpec {
    /// Creates a new strategy spec with no parameters.
    #[must_use]
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            params: JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Creates a new strategy spec with the given parameters.
    #[must_use]
    pub fn with_params(strategy: impl Into<String>, params: JsonValue) -> Self {
        Self {
            strategy: strategy.into(),
            params,
        }
    }
}

/// A directed edge: cost flows from `parent_id` (the source) to
/// `child_id` (the receiver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Opaque identifier.
    pub id: EdgeId,
    /// The source node (cost flows from here).
    pub parent_id: NodeId,
    /// The receiver node (cost flows to here).
    pub child_id: NodeId,
    /// Strategy used absent a more specific override.
    pub default_strategy: StrategySpec,
    /// First date (inclusive) this edge is active.
    pub active_from: CostDate,
    /// First date (exclusive) this edge is no longer active. `None` means
    /// the edge is active indefinitely from `active_from`.
    pub active_to: Option<CostDate>,
}

impl Edge {
    /// Returns `true` if this edge is active on `date`, per the half-open
    /// interval `[active_from, active_to)`. An edge whose `active_to`
    /// equals `active_from` is never active.
    #[must_use]
    pub fn is_active_on(&self, date: CostDate) -> bool {
        if date < self.active_from {
            return false;
        }
        match self.active_to {
            Some(to) => date < to,
            None => true,
        }
    }
}

/// A per-dimension (or all-dimension) override of an edge's strategy.
///
/// If `dimension` is `None` the override applies to every dimension on
/// that edge; otherwise it applies only to the named dimension. The most
/// specific override wins: dimension-specific beats dimension-`None`
/// beats the edge's own `default_strategy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeStrategyOverride {
    /// Opaque identifier.
    pub id: OverrideId,
    /// The edge this override applies to.
    pub edge_id: EdgeId,
    /// The dimension this override is scoped to, or `None` for all
    /// dimensions on the edge.
    pub dimension: Option<Dimension>,
    /// The strategy to use instead of the edge's default.
    pub strategy: StrategySpec,
}

/// A direct cost recorded on a node for one date and dimension.
///
/// Uniquely keyed by `(node_id, cost_date, dimension)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectCost {
    /// The node this cost originated on.
    pub node_id: NodeId,
    /// The calendar day this cost applies to.
    pub cost_date: CostDate,
    /// The cost dimension, e.g. `instance_hours`.
    pub dimension: Dimension,
    /// The cost amount. Must be non-negative.
    pub amount: Decimal,
    /// The currency the amount is denominated in.
    pub currency: Currency,
}

/// A usage observation recorded on a node for one date and metric.
///
/// Uniquely keyed by `(node_id, usage_date, metric, labels)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSample {
    /// The node this usage was observed on.
    pub node_id: NodeId,
    /// The calendar day this usage applies to.
    pub usage_date: CostDate,
    /// The usage metric, e.g. `cpu_hours`.
    pub metric: Metric,
    /// The observed value. Must be non-negative.
    pub value: Decimal,
    /// The unit of measure, e.g. `"hours"` or `"GB"`.
    pub unit: String,
    /// Labels used by `segment_filtered_proportional` and similar
    /// strategies to filter usage to a subset of samples.
    pub labels: Labels,
    /// Identifies where this sample was ingested from.
    pub source: String,
}

/// Lifecycle state of a batch allocation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, no daily tasks have dispatched yet.
    Pending,
    /// At least one daily task has dispatched.
    Running,
    /// All daily outputs committed successfully.
    Completed,
    /// Aborted; no partial outputs are visible.
    Failed,
}

/// A batch allocation run over a date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Opaque identifier.
    pub id: RunId,
    /// First day (inclusive) of the run's window.
    pub window_start: CostDate,
    /// Last day (inclusive) of the run's window.
    pub window_end: CostDate,
    /// Graph structural hash for each date processed, for reproducibility
    /// verification.
    pub graph_hashes_by_date: BTreeMap<CostDate, String>,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the run reached a terminal state, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Human-readable notes, including non-fatal warnings and failure
    /// reasons.
    pub notes: Option<String>,
}

/// Per-node allocation output for one run, date, and dimension.
///
/// `total_amount` always equals `direct_amount + indirect_amount` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    /// The run this result belongs to.
    pub run_id: RunId,
    /// The node this allocation is for.
    pub node_id: NodeId,
    /// The calendar day this allocation applies to.
    pub allocation_date: CostDate,
    /// The cost dimension.
    pub dimension: Dimension,
    /// Cost originating directly on this node.
    pub direct_amount: Decimal,
    /// Cost received via incoming edges.
    pub indirect_amount: Decimal,
    /// `direct_amount + indirect_amount`.
    pub total_amount: Decimal,
}

/// Per-edge contribution output for one run, date, and dimension.
///
/// Idempotently keyed by `(run_id, parent_id, child_id, date, dimension)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionResult {
    /// The run this result belongs to.
    pub run_id: RunId,
    /// The source node of the edge this contribution flowed along.
    pub parent_id: NodeId,
    /// The receiver node of the edge this contribution flowed along.
    pub child_id: NodeId,
    /// The calendar day this contribution applies to.
    pub contribution_date: CostDate,
    /// The cost dimension.
    pub dimension: Dimension,
    /// The absolute amount that flowed along this edge.
    pub contributed_amount: Decimal,
    /// Ordered sequence of node ids from the ultimate cost source to this
    /// edge's receiver.
    pub path: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_half_open_active_window() {
        let d1 = CostDate::from_ymd(2024, 1, 1).unwrap();
        let d2 = CostDate::from_ymd(2024, 1, 10).unwrap();
        let edge = Edge {
            id: EdgeId::new(),
            parent_id: NodeId::new(),
            child_id: NodeId::new(),
            default_strategy: StrategySpec::new("equal"),
            active_from: d1,
            active_to: Some(d2),
        };
        assert!(edge.is_active_on(d1));
        assert!(!edge.is_active_on(d2));
        assert!(edge.is_active_on(d1.add_days(5)));
    }

    #[test]
    fn test_edge_zero_width_window_never_active() {
        let d1 = CostDate::from_ymd(2024, 1, 1).unwrap();
        let edge = Edge {
            id: EdgeId::new(),
            parent_id: NodeId::new(),
            child_id: NodeId::new(),
            default_strategy: StrategySpec::new("equal"),
            active_from: d1,
            active_to: Some(d1),
        };
        assert!(!edge.is_active_on(d1));
    }

    #[test]
    fn test_edge_unbounded_active_to() {
        let d1 = CostDate::from_ymd(2024, 1, 1).unwrap();
        let edge = Edge {
            id: EdgeId::new(),
            parent_id: NodeId::new(),
            child_id: NodeId::new(),
            default_strategy: StrategySpec::new("equal"),
            active_from: d1,
            active_to: None,
        };
        assert!(edge.is_active_on(d1.add_days(10_000)));
    }
}
