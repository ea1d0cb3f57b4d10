//! Pure evaluation of a [`StrategyKind`] into a child's share.

use rust_decimal::Decimal;

use costflow_core::NodeId;

use crate::kind::StrategyKind;

/// Usage data for one sibling (one of a parent's outgoing-edge children),
/// already resolved by the caller for the strategy's configured metric.
#[derive(Debug, Clone, Copy)]
pub struct SiblingMetrics {
    /// The child node this usage belongs to.
    pub child_id: NodeId,
    /// Usage of the strategy's metric on the allocation date. Negative
    /// samples are treated as zero by the caller before this point, per
    /// the catalogue's `proportional_on` contract.
    pub current_usage: Decimal,
    /// Decay-weighted usage summed over the strategy's lookback window
    /// (only meaningful for `weighted_average`; equal to `current_usage`
    /// for every other strategy).
    pub windowed_usage: Decimal,
}

impl SiblingMetrics {
    /// Convenience constructor for strategies that don't use a lookback
    /// window: `windowed_usage` mirrors `current_usage`.
    #[must_use]
    pub fn single_day(child_id: NodeId, usage: Decimal) -> Self {
        Self {
            child_id,
            current_usage: usage,
            windowed_usage: usage,
        }
    }
}

/// Evaluates `kind` for `child_id`, given the full sibling set (every
/// child reachable from the same parent's outgoing edges, including
/// `child_id` itself).
///
/// Returns a share in `[0, 1]`. Callers are responsible for summing
/// shares across all of a parent's outgoing edges and enforcing the
/// `Σ share ≤ 1 + ε` invariant — this function only computes one child's
/// share in isolation.
#[must_use]
pub fn evaluate_share(kind: &StrategyKind, child_id: NodeId, siblings: &[SiblingMetrics]) -> Decimal {
    let n = siblings.len();
    if n == 0 {
        return Decimal::ZERO;
    }
    let equal_share = Decimal::ONE / Decimal::from(n as u64);

    match kind {
        StrategyKind::Equal => equal_share,

        StrategyKind::ProportionalOn { .. } => {
            proportional_share(child_id, siblings, equal_share, |s| s.current_usage)
        }

        StrategyKind::FixedPercent { percent } => *percent,

        StrategyKind::CappedProportional { cap, .. } => {
            let share = proportional_share(child_id, siblings, equal_share, |s| s.current_usage);
            share.min(*cap)
        }

        StrategyKind::ResidualToMax { .. } => {
            residual_to_max_share(child_id, siblings, equal_share)
        }

        StrategyKind::WeightedAverage { .. } => {
            proportional_share(child_id, siblings, equal_share, |s| s.windowed_usage)
        }

        StrategyKind::HybridFixedProportional {
            fixed_percent, ..
        } => {
            let n_dec = Decimal::from(n as u64);
            let fixed_term = *fixed_percent / n_dec;
            let proportional_term = proportional_share_or_zero(child_id, siblings, |s| s.current_usage);
            fixed_term + (Decimal::ONE - *fixed_percent) * proportional_term
        }

        StrategyKind::MinFloorProportional {
            min_floor_percent, ..
        } => {
            let n_dec = Decimal::from(n as u64);
            if n_dec * *min_floor_percent >= Decimal::ONE {
                return equal_share;
            }
            let proportional_term = proportional_share_or_zero(child_id, siblings, |s| s.current_usage);
            *min_floor_percent + (Decimal::ONE - n_dec * *min_floor_percent) * proportional_term
        }

        StrategyKind::SegmentFilteredProportional { .. } => {
            // `siblings` already carries usage pre-filtered to the segment
            // by the caller; a child with no matching samples arrives
            // with usage 0 and falls out of the proportional sum
            // naturally (never the `equal` fallback, per the catalogue:
            // "no matching samples -> 0 for that child").
            proportional_share_or_zero(child_id, siblings, |s| s.current_usage)
        }
    }
}

/// Proportional share with an `equal` fallback when every sibling's usage
/// is zero (used by `proportional_on` and `weighted_average`).
fn proportional_share(
    child_id: NodeId,
    siblings: &[SiblingMetrics],
    equal_share: Decimal,
    usage_of: impl Fn(&SiblingMetrics) -> Decimal,
) -> Decimal {
    let total: Decimal = siblings.iter().map(|s| usage_of(s).max(Decimal::ZERO)).sum();
    if total.is_zero() {
        return equal_share;
    }
    let mine = siblings
        .iter()
        .find(|s| s.child_id == child_id)
        .map_or(Decimal::ZERO, |s| usage_of(s).max(Decimal::ZERO));
    mine / total
}

/// Proportional share with a zero fallback (not `equal`) when every
/// sibling's usage is zero — used by the blended strategies, whose
/// all-zero-usage documented behavior is "proportional term drops out",
/// not "fall back to equal" (the floor/fixed term still applies).
fn proportional_share_or_zero(
    child_id: NodeId,
    siblings: &[SiblingMetrics],
    usage_of: impl Fn(&SiblingMetrics) -> Decimal,
) -> Decimal {
    let total: Decimal = siblings.iter().map(|s| usage_of(s).max(Decimal::ZERO)).sum();
    if total.is_zero() {
        return Decimal::ZERO;
    }
    let mine = siblings
        .iter()
        .find(|s| s.child_id == child_id)
        .map_or(Decimal::ZERO, |s| usage_of(s).max(Decimal::ZERO));
    mine / total
}

fn residual_to_max_share(child_id: NodeId, siblings: &[SiblingMetrics], equal_share: Decimal) -> Decimal {
    let total: Decimal = siblings
        .iter()
        .map(|s| s.current_usage.max(Decimal::ZERO))
        .sum();
    if total.is_zero() {
        return equal_share;
    }

    let max_child = siblings
        .iter()
        .fold(None::<&SiblingMetrics>, |acc, s| match acc {
            None => Some(s),
            Some(best) => {
                if s.current_usage > best.current_usage
                    || (s.current_usage == best.current_usage && s.child_id < best.child_id)
                {
                    Some(s)
                } else {
                    Some(best)
                }
            }
        })
        .expect("siblings is non-empty")
        .child_id;

    if child_id == max_child {
        let others_total: Decimal = siblings
            .iter()
            .filter(|s| s.child_id != max_child)
            .map(|s| s.current_usage.max(Decimal::ZERO) / total)
            .sum();
        Decimal::ONE - others_total
    } else {
        let mine = siblings
            .iter()
            .find(|s| s.child_id == child_id)
            .map_or(Decimal::ZERO, |s| s.current_usage.max(Decimal::ZERO));
        mine / total
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
    /// `equal` on N children always assigns each of them `1/N` to full
    /// decimal precision, whatever N is and regardless of usage values
    /// (which `equal` ignores entirely).
    #[test]
    fn equal_share_is_always_one_over_n(n in 1usize..50) {
        let ids: Vec<NodeId> = (0..n).map(|_| NodeId::new()).collect();
        let sibs: Vec<SiblingMetrics> = ids
            .iter()
            .map(|id| SiblingMetrics::single_day(*id, Decimal::ZERO))
            .collect();
        let expected = Decimal::ONE / Decimal::from(n as u64);
        for id in &ids {
            prop_assert_eq!(evaluate_share(&StrategyKind::Equal, *id, &sibs), expected);
        }
    }

    /// `fixed_percent` returns exactly the configured percent, independent
    /// of the sibling set's size or usage.
    #[test]
    fn fixed_percent_share_round_trips_exactly(
        percent_millis in 0i64..=1000,
        n in 1usize..20,
        usages in proptest::collection::vec(0i64..10_000, 1..20),
    ) {
        let percent = Decimal::new(percent_millis, 3);
        let ids: Vec<NodeId> = (0..n).map(|_| NodeId::new()).collect();
        let sibs: Vec<SiblingMetrics> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let usage = usages.get(i % usages.len()).copied().unwrap_or(0);
                SiblingMetrics::single_day(*id, Decimal::from(usage))
            })
            .collect();
        let kind = StrategyKind::FixedPercent { percent };
        for id in &ids {
            prop_assert_eq!(evaluate_share(&kind, *id, &sibs), percent);
        }
    }

    /// `proportional_on` shares always sum to exactly 1 across the sibling
    /// set whenever at least one sibling has positive usage (whether via
    /// the real proportional split or the all-zero `equal` fallback).
    #[test]
    fn proportional_on_shares_sum_to_one(
        usages in proptest::collection::vec(0i64..10_000, 1..30),
    ) {
        let ids: Vec<NodeId> = usages.iter().map(|_| NodeId::new()).collect();
        let sibs: Vec<SiblingMetrics> = ids
            .iter()
            .zip(&usages)
            .map(|(id, u)| SiblingMetrics::single_day(*id, Decimal::from(*u)))
            .collect();
        let kind = StrategyKind::ProportionalOn {
            metric: costflow_core::Metric::new("m"),
        };
        let sum: Decimal = ids.iter().map(|id| evaluate_share(&kind, *id, &sibs)).sum();
        prop_assert_eq!(sum, Decimal::ONE);
    }
    }
}
