//! Per-day read slices: direct costs and usage observations for one
//! allocation date, indexed for cheap lookup during propagation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use costflow_core::types::require_non_negative;
use costflow_core::{CostDate, Dimension, Metric, NodeId};
use costflow_strategy::{SegmentFilter, SiblingMetrics, StrategyKind};
use costflow_traits::{DirectCost, Repositories, UsageSample};

use crate::error::EngineResult;

/// Direct costs and usage observations needed to propagate one day's
/// allocation, already restricted to the dimensions and metrics this
/// day's strategies actually reference.
pub struct DaySlices {
    date: CostDate,
    direct_costs: BTreeMap<(NodeId, Dimension), Decimal>,
    usage: BTreeMap<(NodeId, Metric), Vec<UsageSample>>,
}

impl DaySlices {
    /// Loads a day's direct costs (for `dimensions`) and usage (for
    /// `metrics`, looking back `max_window_days` days for strategies like
    /// `weighted_average`).
    ///
    /// # Errors
    ///
    /// Propagates any repository failure.
    pub async fn load(
        repos: &Repositories,
        date: CostDate,
        dimensions: &[Dimension],
        metrics: &[Metric],
        max_window_days: u32,
    ) -> EngineResult<Self> {
        let costs = repos.costs.by_date_range(date, date, dimensions).await?;

        let lookback = i64::from(max_window_days.max(1)) - 1;
        let window_start = date.add_days(-lookback);
        let usage_samples = if metrics.is_empty() {
            Vec::new()
        } else {
            repos
                .usage
                .by_date_range(window_start, date, metrics, None)
                .await?
        };

        let mut direct_costs = BTreeMap::new();
        for cost in costs {
            if cost.cost_date == date {
                let amount = require_non_negative(cost.amount, "direct cost")?;
                direct_costs.insert((cost.node_id, cost.dimension.clone()), amount);
            }
        }

        let mut usage: BTreeMap<(NodeId, Metric), Vec<UsageSample>> = BTreeMap::new();
        for sample in usage_samples {
            usage
                .entry((sample.node_id, sample.metric.clone()))
                .or_default()
                .push(sample);
        }

        Ok(Self {
            date,
            direct_costs,
            usage,
        })
    }

    /// The direct cost recorded on `node` for `dimension`, or zero.
    #[must_use]
    pub fn direct_cost(&self, node: NodeId, dimension: &Dimension) -> Decimal {
        self.direct_costs
            .get(&(node, dimension.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Raw, non-negative usage on `self.date` for `(node, metric)`,
    /// summing multiple same-day samples and clamping negative values to
    /// zero (logging a warning, per the catalogue's
    /// `proportional_on` contract: "negative u treated as 0 (warn)").
    fn value_on(&self, node: NodeId, metric: &Metric, date: CostDate) -> Decimal {
        self.usage
            .get(&(node, metric.clone()))
            .into_iter()
            .flatten()
            .filter(|s| s.usage_date == date)
            .map(|s| {
                if s.value < Decimal::ZERO {
                    tracing::warn!(node = %node, metric = %metric, value = %s.value, "negative usage sample treated as zero");
                    Decimal::ZERO
                } else {
                    s.value
                }
            })
            .sum()
    }

    /// Same as [`DaySlices::value_on`] but restricted to samples whose
    /// labels satisfy `filter`.
    fn value_on_filtered(
        &self,
        node: NodeId,
        metric: &Metric,
        date: CostDate,
        filter: &SegmentFilter,
    ) -> Decimal {
        self.usage
            .get(&(node, metric.clone()))
            .into_iter()
            .flatten()
            .filter(|s| s.usage_date == date)
            .filter(|s| {
                s.labels
                    .get(&filter.label)
                    .is_some_and(|v| filter.values.contains(v))
            })
            .map(|s| s.value.max(Decimal::ZERO))
            .sum()
    }

    /// Decay-weighted usage summed over `window_days` trailing days
    /// ending at `self.date`. Days with no recorded sample contribute
    /// zero, which is equivalent to clipping the window to the data that
    /// actually exists.
    fn windowed_value(
        &self,
        node: NodeId,
        metric: &Metric,
        window_days: u32,
        decay: Decimal,
    ) -> Decimal {
        let mut total = Decimal::ZERO;
        let mut weight = Decimal::ONE;
        for k in 0..window_days {
            let day = self.date.add_days(-i64::from(k));
            total += weight * self.value_on(node, metric, day);
            weight *= decay;
        }
        total
    }

    /// Builds the sibling usage set consulted by `kind` for `children`,
    /// resolving whichever single-day, windowed, or segment-filtered
    /// usage the strategy needs.
    #[must_use]
    pub fn sibling_metrics(&self, kind: &StrategyKind, children: &[NodeId]) -> Vec<SiblingMetrics> {
        let Some(metric) = kind.metric() else {
            return children
                .iter()
                .map(|&child_id| SiblingMetrics::single_day(child_id, Decimal::ZERO))
                .collect();
        };

        if let Some(filter) = kind.segment_filter() {
            return children
                .iter()
                .map(|&child_id| {
                    let usage = self.value_on_filtered(child_id, metric, self.date, filter);
                    SiblingMetrics::single_day(child_id, usage)
                })
                .collect();
        }

        if let Some((window_days, decay)) = kind.window() {
            return children
                .iter()
                .map(|&child_id| SiblingMetrics {
                    child_id,
                    current_usage: self.value_on(child_id, metric, self.date),
                    windowed_usage: self.windowed_value(child_id, metric, window_days, decay),
                })
                .collect();
        }

        children
            .iter()
            .map(|&child_id| SiblingMetrics::single_day(child_id, self.value_on(child_id, metric, self.date)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(node: NodeId, metric: &str, date: CostDate, value: Decimal) -> UsageSample {
        UsageSample {
            node_id: node,
            usage_date: date,
            metric: Metric::new(metric),
            value,
            unit: "hours".into(),
            labels: Default::default(),
            source: "test".into(),
        }
    }

    #[test]
    fn test_direct_cost_default_zero() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let slices = DaySlices {
            date,
            direct_costs: BTreeMap::new(),
            usage: BTreeMap::new(),
        };
        assert_eq!(slices.direct_cost(NodeId::new(), &Dimension::new("x")), Decimal::ZERO);
    }

    #[test]
    fn test_windowed_value_with_decay() {
        let date = CostDate::from_ymd(2024, 1, 10).unwrap();
        let node = NodeId::new();
        let metric = Metric::new("cpu_hours");
        let mut usage = BTreeMap::new();
        usage.insert(
            (node, metric.clone()),
            vec![
                sample(node, "cpu_hours", date, dec!(10)),
                sample(node, "cpu_hours", date.add_days(-1), dec!(10)),
            ],
        );
        let slices = DaySlices {
            date,
            direct_costs: BTreeMap::new(),
            usage,
        };
        // window=2, decay=0.5: day0 contributes 10, day-1 contributes 10*0.5=5
        let total = slices.windowed_value(node, &metric, 2, dec!(0.5));
        assert_eq!(total, dec!(15));
    }

    #[tokio::test]
    async fn test_negative_direct_cost_rejected() {
        use async_trait::async_trait;
        use costflow_core::RunId;
        use costflow_traits::{
            CostRepository, EdgeStrategyOverride, LabelFilter, NodeRepository, EdgeRepository,
            Repositories, RepositoryResult, Run, RunRepository, RunStatus,
            StrategyOverrideRepository, TransactionScope, UsageRepository,
        };
        use std::sync::Arc;

        struct NegativeCostRepo;
        #[async_trait]
        impl CostRepository for NegativeCostRepo {
            async fn by_date_range(
                &self,
                _start: CostDate,
                _end: CostDate,
                _dimensions: &[Dimension],
            ) -> RepositoryResult<Vec<costflow_traits::DirectCost>> {
                Ok(vec![costflow_traits::DirectCost {
                    node_id: NodeId::new(),
                    cost_date: CostDate::from_ymd(2024, 1, 1).unwrap(),
                    dimension: Dimension::new("instance_hours"),
                    amount: dec!(-5),
                    currency: costflow_core::Currency::USD,
                }])
            }
        }

        struct Empty;
        #[async_trait]
        impl UsageRepository for Empty {
            async fn by_date_range(
                &self,
                _start: CostDate,
                _end: CostDate,
                _metrics: &[Metric],
                _label_filter: Option<&LabelFilter>,
            ) -> RepositoryResult<Vec<UsageSample>> {
                Ok(vec![])
            }
        }
        #[async_trait]
        impl NodeRepository for Empty {
            async fn list(&self, _include_archived: bool) -> RepositoryResult<Vec<costflow_traits::Node>> {
                Ok(vec![])
            }
            async fn get(&self, _id: NodeId) -> RepositoryResult<Option<costflow_traits::Node>> {
                Ok(None)
            }
        }
        #[async_trait]
        impl EdgeRepository for Empty {
            async fn active_on(&self, _date: CostDate) -> RepositoryResult<Vec<costflow_traits::Edge>> {
                Ok(vec![])
            }
        }
        #[async_trait]
        impl StrategyOverrideRepository for Empty {
            async fn for_edges(
                &self,
                _edge_ids: &[costflow_core::EdgeId],
            ) -> RepositoryResult<Vec<EdgeStrategyOverride>> {
                Ok(vec![])
            }
        }
        #[async_trait]
        impl RunRepository for Empty {
            async fn create(&self, _w0: CostDate, _w1: CostDate) -> RepositoryResult<RunId> {
                Ok(RunId::new())
            }
            async fn get(&self, _run_id: RunId) -> RepositoryResult<Option<Run>> {
                Ok(None)
            }
            async fn set_status(&self, _run_id: RunId, _status: RunStatus, _notes: Option<String>) -> RepositoryResult<()> {
                Ok(())
            }
            async fn record_graph_hash(&self, _run_id: RunId, _date: CostDate, _hash: String) -> RepositoryResult<()> {
                Ok(())
            }
            async fn begin_transaction(&self, _run_id: RunId) -> RepositoryResult<Box<dyn TransactionScope>> {
                unimplemented!("not exercised by this test")
            }
            async fn write_allocations(
                &self,
                _scope: &mut dyn TransactionScope,
                _run_id: RunId,
                _results: &[costflow_traits::AllocationResult],
            ) -> RepositoryResult<()> {
                Ok(())
            }
            async fn write_contributions(
                &self,
                _scope: &mut dyn TransactionScope,
                _run_id: RunId,
                _results: &[costflow_traits::ContributionResult],
            ) -> RepositoryResult<()> {
                Ok(())
            }
        }

        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let repos = Repositories {
            nodes: Arc::new(Empty),
            edges: Arc::new(Empty),
            overrides: Arc::new(Empty),
            costs: Arc::new(NegativeCostRepo),
            usage: Arc::new(Empty),
            runs: Arc::new(Empty),
        };
        let result = DaySlices::load(&repos, date, &[Dimension::new("instance_hours")], &[], 1).await;
        assert!(matches!(result, Err(crate::error::EngineError::InvalidAmount(_))));
    }

    #[test]
    fn test_negative_usage_clamped_to_zero() {
        let date = CostDate::from_ymd(2024, 1, 1).unwrap();
        let node = NodeId::new();
        let metric = Metric::new("cpu_hours");
        let mut usage = BTreeMap::new();
        usage.insert((node, metric.clone()), vec![sample(node, "cpu_hours", date, dec!(-5))]);
        let slices = DaySlices {
            date,
            direct_costs: BTreeMap::new(),
            usage,
        };
        assert_eq!(slices.value_on(node, &metric, date), Decimal::ZERO);
    }
}
