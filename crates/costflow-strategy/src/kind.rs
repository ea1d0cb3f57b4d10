//! The closed catalogue of allocation strategies.
//!
//! Rather than runtime trait-object dispatch, the catalogue is a closed
//! tagged union of strategy kinds, each carrying its own validated
//! parameters. Evaluation is a pure function over
//! `(kind, child, siblings)`.

use rust_decimal::Decimal;
use serde::Deserialize;

use costflow_core::Metric;
use costflow_traits::StrategySpec;

use crate::error::{StrategyError, StrategyResult};

/// A label-value filter restricting usage samples considered by
/// `segment_filtered_proportional`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFilter {
    /// The label key to match.
    pub label: String,
    /// The set of values that satisfy the filter.
    pub values: Vec<String>,
}

/// The closed set of recognized allocation strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    /// Equal split across all outgoing edges.
    Equal,
    /// Proportional to usage of a metric.
    ProportionalOn {
        /// The usage metric to allocate on.
        metric: Metric,
    },
    /// A fixed percentage of the parent's total.
    FixedPercent {
        /// The fixed share, normalized to `[0, 1]`.
        percent: Decimal,
    },
    /// Proportional to usage, capped at a maximum share.
    CappedProportional {
        /// The usage metric to allocate on.
        metric: Metric,
        /// The maximum share any one child may receive, in `[0, 1]`.
        cap: Decimal,
    },
    /// Proportional for all children except the highest-usage one, which
    /// absorbs the residual.
    ResidualToMax {
        /// The usage metric to allocate on.
        metric: Metric,
    },
    /// Proportional to a decay-weighted sum of usage over a lookback
    /// window.
    WeightedAverage {
        /// The usage metric to allocate on.
        metric: Metric,
        /// The number of trailing days (including the allocation date) to
        /// consider.
        window_days: u32,
        /// Per-day decay factor applied to older samples. `1.0` means no
        /// decay.
        decay: Decimal,
    },
    /// A blend of a fixed floor, split equally, and a proportional
    /// remainder.
    HybridFixedProportional {
        /// The usage metric to allocate on.
        metric: Metric,
        /// The fixed portion of the total split equally, in `[0, 1]`.
        fixed_percent: Decimal,
    },
    /// A guaranteed minimum share per child, topped up proportionally.
    MinFloorProportional {
        /// The usage metric to allocate on.
        metric: Metric,
        /// The guaranteed minimum share per child, in `[0, 1]`.
        min_floor_percent: Decimal,
    },
    /// Proportional to usage, restricted to samples matching a label
    /// filter.
    SegmentFilteredProportional {
        /// The usage metric to allocate on.
        metric: Metric,
        /// The label filter restricting which samples are summed.
        segment_filter: SegmentFilter,
    },
}

impl StrategyKind {
    /// The usage metric this strategy consults, if any.
    #[must_use]
    pub fn metric(&self) -> Option<&Metric> {
        match self {
            StrategyKind::Equal | StrategyKind::FixedPercent { .. } => None,
            StrategyKind::ProportionalOn { metric }
            | StrategyKind::CappedProportional { metric, .. }
            | StrategyKind::ResidualToMax { metric }
            | StrategyKind::WeightedAverage { metric, .. }
            | StrategyKind::HybridFixedProportional { metric, .. }
            | StrategyKind::MinFloorProportional { metric, .. }
            | StrategyKind::SegmentFilteredProportional { metric, .. } => Some(metric),
        }
    }

    /// The `(window_days, decay)` lookback parameters, for
    /// `weighted_average` only.
    #[must_use]
    pub fn window(&self) -> Option<(u32, Decimal)> {
        match self {
            StrategyKind::WeightedAverage {
                window_days, decay, ..
            } => Some((*window_days, *decay)),
            _ => None,
        }
    }

    /// The segment filter, for `segment_filtered_proportional` only.
    #[must_use]
    pub fn segment_filter(&self) -> Option<&SegmentFilter> {
        match self {
            StrategyKind::SegmentFilteredProportional { segment_filter, .. } => {
                Some(segment_filter)
            }
            _ => None,
        }
    }

    /// Parses and validates a persisted strategy spec into a closed
    /// [`StrategyKind`].
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::UnknownStrategy` if `spec.strategy` is not
    /// a recognized name, or `StrategyError::InvalidStrategyParams` if the
    /// parameters don't parse or fail range validation.
    pub fn parse(spec: &StrategySpec) -> StrategyResult<StrategyKind> {
        match spec.strategy.as_str() {
            "equal" => Ok(StrategyKind::Equal),
            "proportional_on" => {
                let p: MetricParams = parse_params(spec)?;
                Ok(StrategyKind::ProportionalOn {
                    metric: Metric::new(p.metric),
                })
            }
            "fixed_percent" => {
                let p: PercentParams = parse_params(spec)?;
                Ok(StrategyKind::FixedPercent {
                    percent: normalize_percent(spec, p.percent)?,
                })
            }
            "capped_proportional" => {
                let p: CappedParams = parse_params(spec)?;
                Ok(StrategyKind::CappedProportional {
                    metric: Metric::new(p.metric),
                    cap: normalize_percent(spec, p.cap)?,
                })
            }
            "residual_to_max" => {
                let p: MetricParams = parse_params(spec)?;
                Ok(StrategyKind::ResidualToMax {
                    metric: Metric::new(p.metric),
                })
            }
            "weighted_average" => {
                let p: WeightedAverageParams = parse_params(spec)?;
                if p.window_days == 0 {
                    return Err(StrategyError::InvalidStrategyParams {
                        strategy: spec.strategy.clone(),
                        reason: "window_days must be at least 1".into(),
                    });
                }
                Ok(StrategyKind::WeightedAverage {
                    metric: Metric::new(p.metric),
                    window_days: p.window_days,
                    decay: p.decay.unwrap_or(Decimal::ONE),
                })
            }
            "hybrid_fixed_proportional" => {
                let p: HybridParams = parse_params(spec)?;
                Ok(StrategyKind::HybridFixedProportional {
                    metric: Metric::new(p.metric),
                    fixed_percent: normalize_percent(spec, p.fixed_percent)?,
                })
            }
            "min_floor_proportional" => {
                let p: MinFloorParams = parse_params(spec)?;
                Ok(StrategyKind::MinFloorProportional {
                    metric: Metric::new(p.metric),
                    min_floor_percent: normalize_percent(spec, p.min_floor_percent)?,
                })
            }
            "segment_filtered_proportional" => {
                let p: SegmentFilteredParams = parse_params(spec)?;
                if p.segment_filter.values.is_empty() {
                    return Err(StrategyError::InvalidStrategyParams {
                        strategy: spec.strategy.clone(),
                        reason: "segment_filter.values must not be empty".into(),
                    });
                }
                Ok(StrategyKind::SegmentFilteredProportional {
                    metric: Metric::new(p.metric),
                    segment_filter: SegmentFilter {
                        label: p.segment_filter.label,
                        values: p.segment_filter.values,
                    },
                })
            }
            other => Err(StrategyError::UnknownStrategy(other.to_string())),
        }
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(spec: &StrategySpec) -> StrategyResult<T> {
    serde_json::from_value(spec.params.clone()).map_err(|e| StrategyError::InvalidStrategyParams {
        strategy: spec.strategy.clone(),
        reason: e.to_string(),
    })
}

/// Normalizes a percent expressed either as `0..=1` or `0..=100` into
/// `0..=1`, per the catalogue's "0–1 or 0–100, normalized" contract.
fn normalize_percent(spec: &StrategySpec, value: Decimal) -> StrategyResult<Decimal> {
    let normalized = if value > Decimal::ONE {
        value / Decimal::from(100)
    } else {
        value
    };
    if normalized < Decimal::ZERO || normalized > Decimal::ONE {
        return Err(StrategyError::InvalidStrategyParams {
            strategy: spec.strategy.clone(),
            reason: format!("percent {value} is out of range"),
        });
    }
    Ok(normalized)
}

#[derive(Debug, Deserialize)]
struct MetricParams {
    metric: String,
}

#[derive(Debug, Deserialize)]
struct PercentParams {
    percent: Decimal,
}

#[derive(Debug, Deserialize)]
struct CappedParams {
    metric: String,
    cap: Decimal,
}

#[derive(Debug, Deserialize)]
struct WeightedAverageParams {
    metric: String,
    window_days: u32,
    decay: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct HybridParams {
    metric: String,
    fixed_percent: Decimal,
}

#[derive(Debug, Deserialize)]
struct MinFloorParams {
    metric: String,
    min_floor_percent: Decimal,
}

#[derive(Debug, Deserialize)]
struct SegmentFilteredParams {
    metric: String,
    segment_filter: SegmentFilterParams,
}

#[derive(Debug, Deserialize)]
struct SegmentFilterParams {
    label: String,
    values: Vec<String>,
}
