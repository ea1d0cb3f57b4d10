//! Per-day allocation propagation (§4.4).
//!
//! `allocate_day` builds the day's graph snapshot, validates it, loads the
//! direct costs and usage it needs, and propagates holistic costs in
//! topological order, recording per-node allocations and per-edge
//! contributions while enforcing the engine's numeric invariants as it
//! goes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use costflow_core::types::round_for_persistence;
use costflow_core::{CostDate, Dimension, EdgeId, Metric, NodeId, RunId};
use costflow_graph::{GraphSnapshot, Validator};
use costflow_strategy::{evaluate_share, StrategyKind};
use costflow_traits::{
    AllocationResult, ContributionResult, Edge, EdgeStrategyOverride, Repositories,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::invariants::{
    check_conservation, check_share_bounds, check_share_sum, check_total_decomposition,
};
use crate::slices::DaySlices;
use crate::strategy_selection::effective_strategy;

/// Everything produced by propagating one day's allocation across every
/// requested dimension.
#[derive(Debug, Clone, Default)]
pub struct DayAllocationOutput {
    /// Per-node allocation rows for this date, across all dimensions.
    pub allocations: Vec<AllocationResult>,
    /// Per-edge contribution rows for this date, across all dimensions.
    pub contributions: Vec<ContributionResult>,
    /// The day's deterministic graph structural hash.
    pub graph_hash: String,
    /// Non-fatal warnings surfaced by validation (e.g. isolated nodes,
    /// platforms with children) — recorded on the run's notes, not fatal.
    pub warnings: Vec<String>,
}

/// Runs the full per-day contract: snapshot, validate, load slices,
/// propagate, check invariants.
///
/// # Errors
///
/// Returns `EngineError::GraphInvalid` if the day's graph fails
/// validation, `EngineError::InvalidStrategyParams` if an edge's
/// effective strategy doesn't parse, `EngineError::ShareSumExceedsOne` /
/// `InvariantViolation` if propagated numbers fail an invariant, or
/// whatever repository error was encountered loading inputs.
pub async fn allocate_day(
    repos: &Repositories,
    run_id: RunId,
    date: CostDate,
    dimensions: &[Dimension],
    config: &EngineConfig,
) -> EngineResult<DayAllocationOutput> {
    let nodes = repos.nodes.list(false).await?;
    let edges = repos.edges.active_on(date).await?;
    let snapshot = GraphSnapshot::build(date, nodes, edges);

    let report = Validator::validate(&snapshot);
    if !report.valid {
        return Err(EngineError::GraphInvalid(format!(
            "{date}: {} error(s): {:?}",
            report.errors.len(),
            report.errors
        )));
    }
    let warnings: Vec<String> = report.warnings.iter().map(|w| format!("{date}: {w:?}")).collect();

    let edge_ids: Vec<EdgeId> = snapshot
        .node_ids()
        .flat_map(|n| snapshot.edges_from(n).iter().copied())
        .collect();
    let overrides = repos.overrides.for_edges(&edge_ids).await?;
    let mut overrides_by_edge: BTreeMap<EdgeId, Vec<EdgeStrategyOverride>> = BTreeMap::new();
    for o in overrides {
        overrides_by_edge.entry(o.edge_id).or_default().push(o);
    }

    let order = snapshot.topological_order()?;

    // Resolve every (edge, dimension)'s effective strategy up front so we
    // know which metrics and lookback window the day's slices need.
    let mut kinds: BTreeMap<(EdgeId, Dimension), StrategyKind> = BTreeMap::new();
    let mut max_window_days: u32 = 1;
    let mut metrics: Vec<Metric> = Vec::new();

    for node_id in &order {
        for edge_id in snapshot.edges_from(*node_id) {
            let edge = snapshot.edge(*edge_id).expect("edge_id from edges_from exists in snapshot");
            let edge_overrides = overrides_by_edge
                .get(edge_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for dim in dimensions {
                let kind = effective_strategy(edge, dim, edge_overrides)?;
                if let Some((window, _decay)) = kind.window() {
                    max_window_days = max_window_days.max(window);
                }
                if let Some(metric) = kind.metric() {
                    if !metrics.contains(metric) {
                        metrics.push(metric.clone());
                    }
                }
                kinds.insert((*edge_id, dim.clone()), kind);
            }
        }
    }

    let slices = DaySlices::load(repos, date, dimensions, &metrics, max_window_days).await?;

    let mut allocations = Vec::new();
    let mut contributions = Vec::new();

    for dim in dimensions {
        propagate_dimension(
            &snapshot,
            &slices,
            &kinds,
            &order,
            dim,
            run_id,
            date,
            config,
            &mut allocations,
            &mut contributions,
        )?;
    }

    Ok(DayAllocationOutput {
        allocations,
        contributions,
        graph_hash: snapshot.hash().to_string(),
        warnings,
    })
}

#[allow(clippy::too_many_arguments)]
fn propagate_dimension(
    snapshot: &GraphSnapshot,
    slices: &DaySlices,
    kinds: &BTreeMap<(EdgeId, Dimension), StrategyKind>,
    order: &[NodeId],
    dim: &Dimension,
    run_id: RunId,
    date: CostDate,
    config: &EngineConfig,
    allocations: &mut Vec<AllocationResult>,
    contributions: &mut Vec<ContributionResult>,
) -> EngineResult<()> {
    let raw_direct_total: Decimal = order.iter().map(|n| slices.direct_cost(*n, dim)).sum();
    let tolerance = config.tolerance_for(raw_direct_total);

    let mut indirect: BTreeMap<NodeId, Decimal> = BTreeMap::new();
    let mut final_cost_centre_total = Decimal::ZERO;
    let mut unallocated = Decimal::ZERO;

    for &node_id in order {
        let direct = slices.direct_cost(node_id, dim);
        let node_indirect = indirect.get(&node_id).copied().unwrap_or(Decimal::ZERO);
        let total = direct + node_indirect;
        check_total_decomposition(node_id, dim, direct, node_indirect, total)?;

        // Propagation itself stays at full precision (`direct`/`node_indirect`/
        // `total` feed the invariant checks and downstream contributions
        // below); only the emitted row is rounded, per the half-even
        // rounding-at-persistence-boundary rule. Round direct and indirect
        // independently, then derive the total from the rounded parts so the
        // persisted row's own decomposition invariant holds exactly.
        let rounded_direct = round_for_persistence(direct);
        let rounded_indirect = round_for_persistence(node_indirect);
        allocations.push(AllocationResult {
            run_id,
            node_id,
            allocation_date: date,
            dimension: dim.clone(),
            direct_amount: rounded_direct,
            indirect_amount: rounded_indirect,
            total_amount: rounded_direct + rounded_indirect,
        });

        let out_edges = snapshot.edges_from(node_id);
        let is_final = snapshot.is_final_cost_centre(node_id);

        if out_edges.is_empty() {
            if is_final {
                final_cost_centre_total += total;
            } else {
                unallocated += total;
            }
            continue;
        }

        let children: Vec<NodeId> = out_edges
            .iter()
            .map(|eid| snapshot.edge(*eid).expect("edge in snapshot").child_id)
            .collect();

        let mut share_sum = Decimal::ZERO;
        for edge_id in out_edges {
            let edge: &Edge = snapshot.edge(*edge_id).expect("edge in snapshot");
            let kind = kinds
                .get(&(*edge_id, dim.clone()))
                .expect("strategy resolved during the metric/window discovery pass");
            let siblings = slices.sibling_metrics(kind, &children);
            let share = evaluate_share(kind, edge.child_id, &siblings);
            check_share_bounds(share, tolerance)?;
            share_sum += share;

            let contributed = total * share;
            // Full-precision `contributed` feeds the child's `indirect`
            // accumulator so rounding never compounds across multiple
            // hops; only the persisted row is rounded.
            *indirect.entry(edge.child_id).or_insert(Decimal::ZERO) += contributed;

            contributions.push(ContributionResult {
                run_id,
                parent_id: node_id,
                child_id: edge.child_id,
                contribution_date: date,
                dimension: dim.clone(),
                contributed_amount: round_for_persistence(contributed),
                path: vec![node_id, edge.child_id],
            });
        }
        check_share_sum(node_id, dim, share_sum, tolerance)?;

        if is_final {
            final_cost_centre_total += total;
        } else {
            let retained = total * (Decimal::ONE - share_sum).max(Decimal::ZERO);
            unallocated += retained;
        }
    }

    check_conservation(dim, final_cost_centre_total, unallocated, raw_direct_total, tolerance)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use costflow_core::{CostDate, NodeId};
    use costflow_traits::{
        CostRepository, Edge as EdgeModel, EdgeRepository, LabelFilter, Node, NodeRepository,
        NodeType, RepositoryResult, Run, RunRepository, RunStatus, StrategyOverrideRepository,
        StrategySpec, TransactionScope, UsageRepository,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;

    fn test_config() -> EngineConfig {
        EngineConfig {
            tolerance_factor: dec!(0.000001),
            ..Default::default()
        }
    }

    struct FixedStore {
        nodes: Vec<Node>,
        edges: Vec<EdgeModel>,
        costs: Vec<costflow_traits::DirectCost>,
        usage: Vec<costflow_traits::UsageSample>,
    }

    #[async_trait]
    impl NodeRepository for FixedStore {
        async fn list(&self, _include_archived: bool) -> RepositoryResult<Vec<Node>> {
            Ok(self.nodes.clone())
        }
        async fn get(&self, id: NodeId) -> RepositoryResult<Option<Node>> {
            Ok(self.nodes.iter().find(|n| n.id == id).cloned())
        }
    }

    #[async_trait]
    impl EdgeRepository for FixedStore {
        async fn active_on(&self, date: CostDate) -> RepositoryResult<Vec<EdgeModel>> {
            Ok(self.edges.iter().filter(|e| e.is_active_on(date)).cloned().collect())
        }
    }

    struct NoOverrides;
    #[async_trait]
    impl StrategyOverrideRepository for NoOverrides {
        async fn for_edges(
            &self,
            _edge_ids: &[costflow_core::EdgeId],
        ) -> RepositoryResult<Vec<costflow_traits::EdgeStrategyOverride>> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl CostRepository for FixedStore {
        async fn by_date_range(
            &self,
            start: CostDate,
            end: CostDate,
            dimensions: &[Dimension],
        ) -> RepositoryResult<Vec<costflow_traits::DirectCost>> {
            Ok(self
                .costs
                .iter()
                .filter(|c| c.cost_date >= start && c.cost_date <= end && dimensions.contains(&c.dimension))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl UsageRepository for FixedStore {
        async fn by_date_range(
            &self,
            start: CostDate,
            end: CostDate,
            metrics: &[Metric],
            _label_filter: Option<&LabelFilter>,
        ) -> RepositoryResult<Vec<costflow_traits::UsageSample>> {
            Ok(self
                .usage
                .iter()
                .filter(|u| u.usage_date >= start && u.usage_date <= end && metrics.contains(&u.metric))
                .cloned()
                .collect())
        }
    }

    struct NoopScope;
    #[async_trait]
    impl TransactionScope for NoopScope {
        async fn commit(self: Box<Self>) -> RepositoryResult<()> {
            Ok(())
        }
        async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
            Ok(())
        }
    }

    struct NoopRuns;
    #[async_trait]
    impl RunRepository for NoopRuns {
        async fn create(&self, _w0: CostDate, _w1: CostDate) -> RepositoryResult<costflow_core::RunId> {
            Ok(costflow_core::RunId::new())
        }
        async fn get(&self, _run_id: costflow_core::RunId) -> RepositoryResult<Option<Run>> {
            Ok(None)
        }
        async fn set_status(
            &self,
            _run_id: costflow_core::RunId,
            _status: RunStatus,
            _notes: Option<String>,
        ) -> RepositoryResult<()> {
            Ok(())
        }
        async fn record_graph_hash(
            &self,
            _run_id: costflow_core::RunId,
            _date: CostDate,
            _hash: String,
        ) -> RepositoryResult<()> {
            Ok(())
        }
        async fn begin_transaction(
            &self,
            _run_id: costflow_core::RunId,
        ) -> RepositoryResult<Box<dyn TransactionScope>> {
            Ok(Box::new(NoopScope))
        }
        async fn write_allocations(
            &self,
            _scope: &mut dyn TransactionScope,
            _run_id: costflow_core::RunId,
            _results: &[AllocationResult],
        ) -> RepositoryResult<()> {
            Ok(())
        }
        async fn write_contributions(
            &self,
            _scope: &mut dyn TransactionScope,
            _run_id: costflow_core::RunId,
            _results: &[ContributionResult],
        ) -> RepositoryResult<()> {
            Ok(())
        }
    }

    fn node(name: &str, node_type: NodeType) -> Node {
        Node {
            id: NodeId::new(),
            name: name.to_string(),
            node_type,
            is_platform: false,
            labels: Default::default(),
            metadata: json!({}),
            archived_at: None,
        }
    }

    fn edge(parent: NodeId, child: NodeId, strategy: StrategySpec, date: CostDate) -> EdgeModel {
        EdgeModel {
            id: costflow_core::EdgeId::new(),
            parent_id: parent,
            child_id: child,
            default_strategy: strategy,
            active_from: date,
            active_to: None,
        }
    }

    fn repositories(store: FixedStore) -> Repositories {
        let store = Arc::new(store);
        Repositories {
            nodes: store.clone(),
            edges: store.clone(),
            overrides: Arc::new(NoOverrides),
            costs: store.clone(),
            usage: store,
            runs: Arc::new(NoopRuns),
        }
    }

    /// S1: basic 1->1 equal split.
    #[tokio::test]
    async fn test_s1_basic_equal_split() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let r = node("R", NodeType::Resource);
        let p = node("P", NodeType::Product);
        let e = edge(r.id, p.id, StrategySpec::new("equal"), date);
        let dim = Dimension::new("instance_hours");

        let repos = repositories(FixedStore {
            nodes: vec![r.clone(), p.clone()],
            edges: vec![e],
            costs: vec![costflow_traits::DirectCost {
                node_id: r.id,
                cost_date: date,
                dimension: dim.clone(),
                amount: dec!(100),
                currency: costflow_core::Currency::USD,
            }],
            usage: vec![],
        });

        let out = allocate_day(&repos, costflow_core::RunId::new(), date, &[dim], &test_config())
            .await
            .unwrap();

        let r_alloc = out.allocations.iter().find(|a| a.node_id == r.id).unwrap();
        assert_eq!(r_alloc.direct_amount, dec!(100));
        assert_eq!(r_alloc.indirect_amount, dec!(0));
        assert_eq!(r_alloc.total_amount, dec!(100));

        let p_alloc = out.allocations.iter().find(|a| a.node_id == p.id).unwrap();
        assert_eq!(p_alloc.direct_amount, dec!(0));
        assert_eq!(p_alloc.total_amount, dec!(100));

        assert_eq!(out.contributions.len(), 1);
        assert_eq!(out.contributions[0].contributed_amount, dec!(100));
    }

    /// S2: shared -> 3 products, equal split, conservation across finals.
    #[tokio::test]
    async fn test_s2_shared_three_way_equal() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let db = node("DB", NodeType::Shared);
        let a = node("A", NodeType::Product);
        let b = node("B", NodeType::Product);
        let c = node("C", NodeType::Product);
        let edges = vec![
            edge(db.id, a.id, StrategySpec::new("equal"), date),
            edge(db.id, b.id, StrategySpec::new("equal"), date),
            edge(db.id, c.id, StrategySpec::new("equal"), date),
        ];
        let dim = Dimension::new("instance_hours");

        let repos = repositories(FixedStore {
            nodes: vec![db.clone(), a.clone(), b.clone(), c.clone()],
            edges,
            costs: vec![costflow_traits::DirectCost {
                node_id: db.id,
                cost_date: date,
                dimension: dim.clone(),
                amount: dec!(300),
                currency: costflow_core::Currency::USD,
            }],
            usage: vec![],
        });

        let out = allocate_day(&repos, costflow_core::RunId::new(), date, &[dim], &test_config())
            .await
            .unwrap();

        for id in [a.id, b.id, c.id] {
            let alloc = out.allocations.iter().find(|x| x.node_id == id).unwrap();
            assert_eq!(alloc.total_amount, dec!(100));
        }
    }

    /// S3: platform -> 2 products, proportional_on cpu_hours.
    #[tokio::test]
    async fn test_s3_proportional_on_usage() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let mut k = node("K", NodeType::Platform);
        k.is_platform = true;
        let w = node("W", NodeType::Product);
        let x = node("X", NodeType::Product);
        let strategy = StrategySpec::with_params(
            "proportional_on",
            json!({"metric": "cpu_hours"}),
        );
        let edges = vec![
            edge(k.id, w.id, strategy.clone(), date),
            edge(k.id, x.id, strategy, date),
        ];
        let dim = Dimension::new("instance_hours");
        let metric = Metric::new("cpu_hours");

        let repos = repositories(FixedStore {
            nodes: vec![k.clone(), w.clone(), x.clone()],
            edges,
            costs: vec![costflow_traits::DirectCost {
                node_id: k.id,
                cost_date: date,
                dimension: dim.clone(),
                amount: dec!(500),
                currency: costflow_core::Currency::USD,
            }],
            usage: vec![
                costflow_traits::UsageSample {
                    node_id: w.id,
                    usage_date: date,
                    metric: metric.clone(),
                    value: dec!(1000),
                    unit: "hours".into(),
                    labels: Default::default(),
                    source: "test".into(),
                },
                costflow_traits::UsageSample {
                    node_id: x.id,
                    usage_date: date,
                    metric,
                    value: dec!(4000),
                    unit: "hours".into(),
                    labels: Default::default(),
                    source: "test".into(),
                },
            ],
        });

        let out = allocate_day(&repos, costflow_core::RunId::new(), date, &[dim], &test_config())
            .await
            .unwrap();

        let w_alloc = out.allocations.iter().find(|a| a.node_id == w.id).unwrap();
        let x_alloc = out.allocations.iter().find(|a| a.node_id == x.id).unwrap();
        assert_eq!(w_alloc.total_amount, dec!(100));
        assert_eq!(x_alloc.total_amount, dec!(400));
    }

    /// S4: partial roll-up with a non-final product retaining residual.
    #[tokio::test]
    async fn test_s4_partial_rollup_retains_residual() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let a = node("A", NodeType::Product);
        let b = node("B", NodeType::Product);
        let c = node("C", NodeType::Product);
        let edges = vec![
            edge(
                a.id,
                b.id,
                StrategySpec::with_params("fixed_percent", json!({"percent": 0.3})),
                date,
            ),
            edge(
                a.id,
                c.id,
                StrategySpec::with_params("fixed_percent", json!({"percent": 0.5})),
                date,
            ),
        ];
        let dim = Dimension::new("instance_hours");

        let repos = repositories(FixedStore {
            nodes: vec![a.clone(), b.clone(), c.clone()],
            edges,
            costs: vec![costflow_traits::DirectCost {
                node_id: a.id,
                cost_date: date,
                dimension: dim.clone(),
                amount: dec!(1000),
                currency: costflow_core::Currency::USD,
            }],
            usage: vec![],
        });

        let out = allocate_day(&repos, costflow_core::RunId::new(), date, &[dim], &test_config())
            .await
            .unwrap();

        let b_alloc = out.allocations.iter().find(|x| x.node_id == b.id).unwrap();
        let c_alloc = out.allocations.iter().find(|x| x.node_id == c.id).unwrap();
        assert_eq!(b_alloc.total_amount, dec!(300));
        assert_eq!(c_alloc.total_amount, dec!(500));
        // A is not a final cost centre (it allocates to other products);
        // its $200 residual is folded into `unallocated`, not a
        // standalone allocation row assertion here — conservation is
        // checked internally by `allocate_day` and would have returned
        // `Err` had it failed.
    }

    /// S5: capped proportional leaves unallocated residual on the parent.
    #[tokio::test]
    async fn test_s5_capped_proportional() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let k = node("K", NodeType::Platform);
        let a = node("A", NodeType::Product);
        let b = node("B", NodeType::Product);
        let strategy = StrategySpec::with_params(
            "capped_proportional",
            json!({"metric": "u", "cap": 0.5}),
        );
        let edges = vec![
            edge(k.id, a.id, strategy.clone(), date),
            edge(k.id, b.id, strategy, date),
        ];
        let dim = Dimension::new("instance_hours");
        let metric = Metric::new("u");

        let repos = repositories(FixedStore {
            nodes: vec![k.clone(), a.clone(), b.clone()],
            edges,
            costs: vec![costflow_traits::DirectCost {
                node_id: k.id,
                cost_date: date,
                dimension: dim.clone(),
                amount: dec!(1000),
                currency: costflow_core::Currency::USD,
            }],
            usage: vec![
                costflow_traits::UsageSample {
                    node_id: a.id,
                    usage_date: date,
                    metric: metric.clone(),
                    value: dec!(90),
                    unit: "u".into(),
                    labels: Default::default(),
                    source: "test".into(),
                },
                costflow_traits::UsageSample {
                    node_id: b.id,
                    usage_date: date,
                    metric,
                    value: dec!(10),
                    unit: "u".into(),
                    labels: Default::default(),
                    source: "test".into(),
                },
            ],
        });

        let out = allocate_day(&repos, costflow_core::RunId::new(), date, &[dim], &test_config())
            .await
            .unwrap();

        let a_contrib = out
            .contributions
            .iter()
            .find(|c| c.child_id == a.id)
            .unwrap();
        let b_contrib = out
            .contributions
            .iter()
            .find(|c| c.child_id == b.id)
            .unwrap();
        assert_eq!(a_contrib.contributed_amount, dec!(500));
        assert_eq!(b_contrib.contributed_amount, dec!(100));
    }

    /// S6: a cycle fails the day with `GraphInvalid`, no outputs produced.
    #[tokio::test]
    async fn test_s6_cycle_detected() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let a = node("A", NodeType::Product);
        let b = node("B", NodeType::Product);
        let edges = vec![
            edge(a.id, b.id, StrategySpec::new("equal"), date),
            edge(b.id, a.id, StrategySpec::new("equal"), date),
        ];
        let dim = Dimension::new("instance_hours");

        let repos = repositories(FixedStore {
            nodes: vec![a, b],
            edges,
            costs: vec![],
            usage: vec![],
        });

        let result = allocate_day(&repos, costflow_core::RunId::new(), date, &[dim], &test_config()).await;
        assert!(matches!(result, Err(EngineError::GraphInvalid(_))));
    }

    /// S7 (partial, single-process determinism): two identical runs over
    /// identical inputs produce byte-identical allocation and contribution
    /// sets, aside from the run id carried on each row.
    #[tokio::test]
    async fn test_determinism_across_runs() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let r = node("R", NodeType::Resource);
        let p = node("P", NodeType::Product);
        let e = edge(r.id, p.id, StrategySpec::new("equal"), date);
        let dim = Dimension::new("instance_hours");

        let make_repos = || {
            repositories(FixedStore {
                nodes: vec![r.clone(), p.clone()],
                edges: vec![e.clone()],
                costs: vec![costflow_traits::DirectCost {
                    node_id: r.id,
                    cost_date: date,
                    dimension: dim.clone(),
                    amount: dec!(100),
                    currency: costflow_core::Currency::USD,
                }],
                usage: vec![],
            })
        };

        let run_a = costflow_core::RunId::new();
        let run_b = costflow_core::RunId::new();
        let out_a = allocate_day(&make_repos(), run_a, date, &[dim.clone()], &test_config())
            .await
            .unwrap();
        let out_b = allocate_day(&make_repos(), run_b, date, &[dim], &test_config())
            .await
            .unwrap();

        assert_eq!(out_a.graph_hash, out_b.graph_hash);
        assert_eq!(out_a.allocations.len(), out_b.allocations.len());
        for (x, y) in out_a.allocations.iter().zip(out_b.allocations.iter()) {
            assert_eq!(x.node_id, y.node_id);
            assert_eq!(x.total_amount, y.total_amount);
        }
    }
}
