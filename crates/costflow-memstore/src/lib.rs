//! # Costflow Memstore
//!
//! An in-memory implementation of every repository contract in
//! `costflow-traits`, backed by `RwLock<HashMap<..>>`. Data does not
//! survive process restart.
//!
//! A stand-in for a real Postgres/redb-backed extension crate — the
//! contract in `costflow-traits::repository` is the only requirement
//! placed on such a crate, and [`InMemoryStore`] satisfies it end to end
//! so the engine and CLI have something runnable without a database.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use costflow_core::{CostDate, Dimension, EdgeId, Metric, NodeId, OverrideId, RunId};
use costflow_traits::{
    AllocationResult, ContributionResult, CostRepository, DirectCost, Edge, EdgeRepository,
    EdgeStrategyOverride, LabelFilter, Node, NodeRepository, RepositoryError, RepositoryResult,
    Run, RunRepository, RunStatus, StrategyOverrideRepository, TransactionScope, UsageRepository,
    UsageSample,
};

/// Idempotency key for an allocation row: `(node_id, date, dimension)`.
type AllocationKey = (NodeId, CostDate, Dimension);

/// Idempotency key for a contribution row: `(parent_id, child_id, date,
/// dimension)`.
type ContributionKey = (NodeId, NodeId, CostDate, Dimension);

/// A run's staged output rows, held until the run's transaction commits.
///
/// Keyed by the repository contract's idempotency key rather than held
/// as a plain `Vec`, so writing the same `(run_id, node_id, date,
/// dimension)` allocation (or the contribution equivalent) twice under
/// the same run is a no-op rather than a duplicate row.
#[derive(Default)]
struct PendingRun {
    allocations: std::collections::BTreeMap<AllocationKey, AllocationResult>,
    contributions: std::collections::BTreeMap<ContributionKey, ContributionResult>,
}

/// In-memory backing store for every repository contract the engine
/// consumes.
///
/// Thread-safe through `RwLock`, mirroring the teacher's in-memory
/// storage adapter: one struct, one lock per collection, no persistence
/// beyond the process lifetime.
pub struct InMemoryStore {
    nodes: RwLock<HashMap<NodeId, Node>>,
    edges: RwLock<HashMap<EdgeId, Edge>>,
    overrides: RwLock<HashMap<OverrideId, EdgeStrategyOverride>>,
    direct_costs: RwLock<HashMap<(NodeId, CostDate, Dimension), DirectCost>>,
    usage: RwLock<Vec<UsageSample>>,
    runs: RwLock<HashMap<RunId, Run>>,
    pending: Arc<RwLock<HashMap<RunId, PendingRun>>>,
    allocations: Arc<RwLock<std::collections::BTreeMap<(RunId, AllocationKey), AllocationResult>>>,
    contributions: Arc<RwLock<std::collections::BTreeMap<(RunId, ContributionKey), ContributionResult>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            edges: RwLock::new(HashMap::new()),
            overrides: RwLock::new(HashMap::new()),
            direct_costs: RwLock::new(HashMap::new()),
            usage: RwLock::new(Vec::new()),
            runs: RwLock::new(HashMap::new()),
            pending: Arc::new(RwLock::new(HashMap::new())),
            allocations: Arc::new(RwLock::new(std::collections::BTreeMap::new())),
            contributions: Arc::new(RwLock::new(std::collections::BTreeMap::new())),
        }
    }

    /// Clears every collection. Useful between test cases or demo runs.
    pub fn clear(&self) {
        self.nodes.write().unwrap().clear();
        self.edges.write().unwrap().clear();
        self.overrides.write().unwrap().clear();
        self.direct_costs.write().unwrap().clear();
        self.usage.write().unwrap().clear();
        self.runs.write().unwrap().clear();
        self.pending.write().unwrap().clear();
        self.allocations.write().unwrap().clear();
        self.contributions.write().unwrap().clear();
    }

    /// Inserts or replaces a node.
    pub fn put_node(&self, node: Node) {
        self.nodes.write().unwrap().insert(node.id, node);
    }

    /// Inserts or replaces an edge.
    pub fn put_edge(&self, edge: Edge) {
        self.edges.write().unwrap().insert(edge.id, edge);
    }

    /// Inserts or replaces an edge strategy override.
    pub fn put_override(&self, over: EdgeStrategyOverride) {
        self.overrides.write().unwrap().insert(over.id, over);
    }

    /// Inserts or replaces a direct cost, keyed by `(node_id, cost_date,
    /// dimension)`.
    pub fn put_direct_cost(&self, cost: DirectCost) {
        self.direct_costs
            .write()
            .unwrap()
            .insert((cost.node_id, cost.cost_date, cost.dimension.clone()), cost);
    }

    /// Appends a usage observation.
    pub fn put_usage_sample(&self, sample: UsageSample) {
        self.usage.write().unwrap().push(sample);
    }

    /// Returns every allocation row committed so far, across all runs.
    #[must_use]
    pub fn allocations(&self) -> Vec<AllocationResult> {
        self.allocations.read().unwrap().values().cloned().collect()
    }

    /// Returns every contribution row committed so far, across all runs.
    #[must_use]
    pub fn contributions(&self) -> Vec<ContributionResult> {
        self.contributions.read().unwrap().values().cloned().collect()
    }

    /// Builds a [`costflow_traits::Repositories`] bundle over `self`,
    /// wrapped in the `Arc` every repository trait object needs.
    #[must_use]
    pub fn into_repositories(self: &Arc<Self>) -> costflow_traits::Repositories {
        costflow_traits::Repositories {
            nodes: self.clone(),
            edges: self.clone(),
            overrides: self.clone(),
            costs: self.clone(),
            usage: self.clone(),
            runs: self.clone(),
        }
    }

    fn lock_err(what: &str) -> RepositoryError {
        RepositoryError::Internal(format!("{what} lock poisoned"))
    }
}

#[async_trait]
impl NodeRepository for InMemoryStore {
    async fn list(&self, include_archived: bool) -> RepositoryResult<Vec<Node>> {
        let nodes = self.nodes.read().map_err(|_| Self::lock_err("nodes"))?;
        Ok(nodes
            .values()
            .filter(|n| include_archived || !n.is_archived())
            .cloned()
            .collect())
    }

    async fn get(&self, id: NodeId) -> RepositoryResult<Option<Node>> {
        let nodes = self.nodes.read().map_err(|_| Self::lock_err("nodes"))?;
        Ok(nodes.get(&id).cloned())
    }
}

#[async_trait]
impl EdgeRepository for InMemoryStore {
    async fn active_on(&self, date: CostDate) -> RepositoryResult<Vec<Edge>> {
        let edges = self.edges.read().map_err(|_| Self::lock_err("edges"))?;
        Ok(edges
            .values()
            .filter(|e| e.is_active_on(date))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StrategyOverrideRepository for InMemoryStore {
    async fn for_edges(&self, edge_ids: &[EdgeId]) -> RepositoryResult<Vec<EdgeStrategyOverride>> {
        let overrides = self
            .overrides
            .read()
            .map_err(|_| Self::lock_err("overrides"))?;
        Ok(overrides
            .values()
            .filter(|o| edge_ids.contains(&o.edge_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CostRepository for InMemoryStore {
    async fn by_date_range(
        &self,
        start: CostDate,
        end: CostDate,
        dimensions: &[Dimension],
    ) -> RepositoryResult<Vec<DirectCost>> {
        let costs = self
            .direct_costs
            .read()
            .map_err(|_| Self::lock_err("direct_costs"))?;
        Ok(costs
            .values()
            .filter(|c| c.cost_date >= start && c.cost_date <= end && dimensions.contains(&c.dimension))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UsageRepository for InMemoryStore {
    async fn by_date_range(
        &self,
        start: CostDate,
        end: CostDate,
        metrics: &[Metric],
        label_filter: Option<&LabelFilter>,
    ) -> RepositoryResult<Vec<UsageSample>> {
        let usage = self.usage.read().map_err(|_| Self::lock_err("usage"))?;
        Ok(usage
            .iter()
            .filter(|s| s.usage_date >= start && s.usage_date <= end && metrics.contains(&s.metric))
            .filter(|s| match label_filter {
                None => true,
                Some(f) => s
                    .labels
                    .get(&f.label)
                    .is_some_and(|v| f.values.contains(v)),
            })
            .cloned()
            .collect())
    }
}

/// A transactional scope over one run's staged writes.
///
/// `begin_transaction` hands out a scope holding clones of the store's
/// `pending`/`allocations`/`contributions` locks (not the store itself,
/// since the trait only gives us `&self`). `commit` flushes the run's
/// staged rows into the visible collections; `rollback` discards them.
/// `write_allocations`/`write_contributions` stage by `run_id` directly
/// on the store, so every write through any scope for the same run lands
/// in the same pending bucket regardless of which scope object issued it.
struct RunScope {
    pending: Arc<RwLock<HashMap<RunId, PendingRun>>>,
    allocations: Arc<RwLock<std::collections::BTreeMap<(RunId, AllocationKey), AllocationResult>>>,
    contributions: Arc<RwLock<std::collections::BTreeMap<(RunId, ContributionKey), ContributionResult>>>,
    run_id: RunId,
}

#[async_trait]
impl TransactionScope for RunScope {
    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let staged = self
            .pending
            .write()
            .map_err(|_| InMemoryStore::lock_err("pending"))?
            .remove(&self.run_id)
            .unwrap_or_default();
        let mut allocations = self
            .allocations
            .write()
            .map_err(|_| InMemoryStore::lock_err("allocations"))?;
        for (key, row) in staged.allocations {
            allocations.insert((self.run_id, key), row);
        }
        let mut contributions = self
            .contributions
            .write()
            .map_err(|_| InMemoryStore::lock_err("contributions"))?;
        for (key, row) in staged.contributions {
            contributions.insert((self.run_id, key), row);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        self.pending
            .write()
            .map_err(|_| InMemoryStore::lock_err("pending"))?
            .remove(&self.run_id);
        Ok(())
    }
}

#[async_trait]
impl RunRepository for InMemoryStore {
    async fn create(&self, window_start: CostDate, window_end: CostDate) -> RepositoryResult<RunId> {
        let id = RunId::new();
        self.runs.write().map_err(|_| Self::lock_err("runs"))?.insert(
            id,
            Run {
                id,
                window_start,
                window_end,
                graph_hashes_by_date: std::collections::BTreeMap::new(),
                status: RunStatus::Pending,
                created_at: Utc::now(),
                completed_at: None,
                notes: None,
            },
        );
        Ok(id)
    }

    async fn get(&self, run_id: RunId) -> RepositoryResult<Option<Run>> {
        Ok(self
            .runs
            .read()
            .map_err(|_| Self::lock_err("runs"))?
            .get(&run_id)
            .cloned())
    }

    async fn set_status(
        &self,
        run_id: RunId,
        status: RunStatus,
        notes: Option<String>,
    ) -> RepositoryResult<()> {
        let mut runs = self.runs.write().map_err(|_| Self::lock_err("runs"))?;
        let run = runs
            .get_mut(&run_id)
            .ok_or_else(|| RepositoryError::NotFound(run_id.to_string()))?;
        run.status = status;
        if matches!(status, RunStatus::Completed | RunStatus::Failed) {
            run.completed_at = Some(Utc::now());
        }
        if notes.is_some() {
            run.notes = notes;
        }
        Ok(())
    }

    async fn record_graph_hash(&self, run_id: RunId, date: CostDate, hash: String) -> RepositoryResult<()> {
        let mut runs = self.runs.write().map_err(|_| Self::lock_err("runs"))?;
        let run = runs
            .get_mut(&run_id)
            .ok_or_else(|| RepositoryError::NotFound(run_id.to_string()))?;
        run.graph_hashes_by_date.insert(date, hash);
        Ok(())
    }

    async fn begin_transaction(&self, run_id: RunId) -> RepositoryResult<Box<dyn TransactionScope>> {
        Ok(Box::new(RunScope {
            pending: self.pending.clone(),
            allocations: self.allocations.clone(),
            contributions: self.contributions.clone(),
            run_id,
        }))
    }

    async fn write_allocations(
        &self,
        _scope: &mut dyn TransactionScope,
        run_id: RunId,
        results: &[AllocationResult],
    ) -> RepositoryResult<()> {
        let mut pending = self.pending.write().map_err(|_| Self::lock_err("pending"))?;
        let staged = &mut pending.entry(run_id).or_default().allocations;
        for row in results {
            let key = (row.node_id, row.allocation_date, row.dimension.clone());
            staged.insert(key, row.clone());
        }
        Ok(())
    }

    async fn write_contributions(
        &self,
        _scope: &mut dyn TransactionScope,
        run_id: RunId,
        results: &[ContributionResult],
    ) -> RepositoryResult<()> {
        let mut pending = self.pending.write().map_err(|_| Self::lock_err("pending"))?;
        let staged = &mut pending.entry(run_id).or_default().contributions;
        for row in results {
            let key = (
                row.parent_id,
                row.child_id,
                row.contribution_date,
                row.dimension.clone(),
            );
            staged.insert(key, row.clone());
        }
        Ok(())
    }
}
