//! Resolving the effective strategy for one edge, dimension, and date.
//!
//! Selection rule (§4.3): the first match among (1) an override scoped to
//! this dimension, (2) an override with no dimension (applies to every
//! dimension on the edge), (3) the edge's own default strategy.

use costflow_core::Dimension;
use costflow_strategy::{StrategyKind, StrategyResult};
use costflow_traits::{Edge, EdgeStrategyOverride};

/// Resolves the effective, validated strategy for `edge` and `dimension`.
///
/// `overrides` should already be restricted to `edge.id` — callers
/// typically group the full override set by edge once per day rather
/// than filtering here on every call.
///
/// # Errors
///
/// Returns `StrategyError::UnknownStrategy` or
/// `StrategyError::InvalidStrategyParams` if the resolved spec doesn't
/// parse into a member of the closed catalogue.
pub fn effective_strategy(
    edge: &Edge,
    dimension: &Dimension,
    overrides: &[EdgeStrategyOverride],
) -> StrategyResult<StrategyKind> {
    if let Some(o) = overrides
        .iter()
        .find(|o| o.dimension.as_ref() == Some(dimension))
    {
        return StrategyKind::parse(&o.strategy);
    }
    if let Some(o) = overrides.iter().find(|o| o.dimension.is_none()) {
        return StrategyKind::parse(&o.strategy);
    }
    StrategyKind::parse(&edge.default_strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use costflow_core::{CostDate, EdgeId, NodeId, OverrideId};
    use costflow_traits::StrategySpec;

    fn edge() -> Edge {
        Edge {
            id: EdgeId::new(),
            parent_id: NodeId::new(),
            child_id: NodeId::new(),
            default_strategy: StrategySpec::new("equal"),
            active_from: CostDate::from_ymd(2024, 1, 1).unwrap(),
            active_to: None,
        }
    }

    #[test]
    fn test_falls_back_to_default_with_no_overrides() {
        let e = edge();
        let dim = Dimension::new("instance_hours");
        let kind = effective_strategy(&e, &dim, &[]).unwrap();
        assert_eq!(kind, StrategyKind::Equal);
    }

    #[test]
    fn test_all_dimension_override_beats_default() {
        let e = edge();
        let dim = Dimension::new("instance_hours");
        let overrides = vec![EdgeStrategyOverride {
            id: OverrideId::new(),
            edge_id: e.id,
            dimension: None,
            strategy: StrategySpec::with_params(
                "fixed_percent",
                serde_json::json!({"percent": 0.4}),
            ),
        }];
        let kind = effective_strategy(&e, &dim, &overrides).unwrap();
        assert!(matches!(kind, StrategyKind::FixedPercent { .. }));
    }

    #[test]
    fn test_dimension_specific_override_beats_all_dimension_override() {
        let e = edge();
        let dim = Dimension::new("instance_hours");
        let other_dim = Dimension::new("storage_gb_month");
        let overrides = vec![
            EdgeStrategyOverride {
                id: OverrideId::new(),
                edge_id: e.id,
                dimension: None,
                strategy: StrategySpec::new("equal"),
            },
            EdgeStrategyOverride {
                id: OverrideId::new(),
                edge_id: e.id,
                dimension: Some(dim.clone()),
                strategy: StrategySpec::with_params(
                    "fixed_percent",
                    serde_json::json!({"percent": 0.75}),
                ),
            },
        ];
        let kind = effective_strategy(&e, &dim, &overrides).unwrap();
        assert!(matches!(kind, StrategyKind::FixedPercent { .. }));

        let other_kind = effective_strategy(&e, &other_dim, &overrides).unwrap();
        assert_eq!(other_kind, StrategyKind::Equal);
    }
}
