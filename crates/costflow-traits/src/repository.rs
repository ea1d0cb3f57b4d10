//! Repository contracts consumed by the allocation engine.
//!
//! These are thin contracts over persisted entities — the engine core
//! never speaks to a concrete store directly. Implementations are
//! extensions (in-memory for tests, a relational store, a document store,
//! ...); the contract below is the only requirement.

use std::sync::Arc;

use async_trait::async_trait;

use costflow_core::{CostDate, Dimension, EdgeId, Metric, NodeId, RunId};

use crate::error::RepositoryResult;
use crate::model::{
    AllocationResult, ContributionResult, DirectCost, Edge, EdgeStrategyOverride, Node, Run,
    RunStatus, UsageSample,
};

/// Optional label filter applied to usage queries, e.g. for
/// `segment_filtered_proportional`.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    /// The label key to match.
    pub label: String,
    /// The set of values that satisfy the filter.
    pub values: Vec<String>,
}

/// Node reference data.
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Lists all nodes. Archived nodes are included only if
    /// `include_archived` is `true`.
    async fn list(&self, include_archived: bool) -> RepositoryResult<Vec<Node>>;

    /// Fetches a single node by id.
    async fn get(&self, id: NodeId) -> RepositoryResult<Option<Node>>;
}

/// Edge reference data.
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// Returns all edges whose `[active_from, active_to)` interval covers
    /// `date`.
    async fn active_on(&self, date: CostDate) -> RepositoryResult<Vec<Edge>>;
}

/// Edge strategy overrides.
#[async_trait]
pub trait StrategyOverrideRepository: Send + Sync {
    /// Returns all overrides declared against any of `edge_ids`.
    async fn for_edges(&self, edge_ids: &[EdgeId]) -> RepositoryResult<Vec<EdgeStrategyOverride>>;
}

/// Direct cost observations.
#[async_trait]
pub trait CostRepository: Send + Sync {
    /// Returns all direct costs in `[start, end]` for the given
    /// dimensions.
    async fn by_date_range(
        &self,
        start: CostDate,
        end: CostDate,
        dimensions: &[Dimension],
    ) -> RepositoryResult<Vec<DirectCost>>;
}

/// Usage observations.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Returns all usage samples in `[start, end]` for the given metrics,
    /// optionally restricted to samples matching `label_filter`.
    async fn by_date_range(
        &self,
        start: CostDate,
        end: CostDate,
        metrics: &[Metric],
        label_filter: Option<&LabelFilter>,
    ) -> RepositoryResult<Vec<UsageSample>>;
}

/// A transactional scope over a single run's writes.
///
/// The coordinator opens one scope per run and either commits every
/// allocation and contribution row written through it, or rolls the
/// entire scope back — partial visibility is never permitted.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    /// Makes every write performed through this scope visible.
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;

    /// Discards every write performed through this scope.
    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

/// Run lifecycle and output storage.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Creates a new run row in the `pending` state and returns its id.
    async fn create(&self, window_start: CostDate, window_end: CostDate) -> RepositoryResult<RunId>;

    /// Fetches a run by id.
    async fn get(&self, run_id: RunId) -> RepositoryResult<Option<Run>>;

    /// Transitions a run to `status`, optionally attaching notes.
    async fn set_status(
        &self,
        run_id: RunId,
        status: RunStatus,
        notes: Option<String>,
    ) -> RepositoryResult<()>;

    /// Records the graph structural hash computed for one date of the
    /// run's window.
    async fn record_graph_hash(
        &self,
        run_id: RunId,
        date: CostDate,
        hash: String,
    ) -> RepositoryResult<()>;

    /// Opens a transactional scope for this run's output writes.
    async fn begin_transaction(&self, run_id: RunId) -> RepositoryResult<Box<dyn TransactionScope>>;

    /// Writes allocation rows within `scope`. Idempotent by
    /// `(run_id, node_id, date, dimension)`.
    async fn write_allocations(
        &self,
        scope: &mut dyn TransactionScope,
        run_id: RunId,
        results: &[AllocationResult],
    ) -> RepositoryResult<()>;

    /// Writes contribution rows within `scope`. Idempotent by
    /// `(run_id, parent_id, child_id, date, dimension)`.
    async fn write_contributions(
        &self,
        scope: &mut dyn TransactionScope,
        run_id: RunId,
        results: &[ContributionResult],
    ) -> RepositoryResult<()>;
}

/// Combined repository bundle handed to the allocation engine.
///
/// Mirrors a storage adapter that groups together the narrow, per-entity
/// contracts above behind one set of trait objects so the engine only
/// needs to thread a single value through its call graph.
#[derive(Clone)]
pub struct Repositories {
    /// Node reference data.
    pub nodes: Arc<dyn NodeRepository>,
    /// Edge reference data.
    pub edges: Arc<dyn EdgeRepository>,
    /// Edge strategy overrides.
    pub overrides: Arc<dyn StrategyOverrideRepository>,
    /// Direct cost observations.
    pub costs: Arc<dyn CostRepository>,
    /// Usage observations.
    pub usage: Arc<dyn UsageRepository>,
    /// Run lifecycle and output storage.
    pub runs: Arc<dyn RunRepository>,
}
