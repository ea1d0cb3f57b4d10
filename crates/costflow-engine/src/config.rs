//! Engine configuration.

use rust_decimal::Decimal;
use std::time::Duration;

use costflow_core::types::default_tolerance;

use crate::runtime::RetryConfig;

/// Tunables for a run of the allocation engine.
///
/// Mirrors the shape of a pricing engine's config: a handful of knobs
/// with sane defaults, constructed once and shared read-only across a
/// run's day-tasks.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on the number of daily tasks executing concurrently.
    /// Defaults to the number of available CPU cores.
    pub max_concurrent_days: usize,
    /// Multiplier applied to a day's raw total cost to derive the
    /// rounding tolerance `τ` used by invariant checks. Default `1e-6`.
    pub tolerance_factor: Decimal,
    /// Retry policy applied to transient repository I/O errors.
    pub retry: RetryConfig,
    /// Optional wall-clock deadline for an entire run. `None` means no
    /// deadline.
    pub run_deadline: Option<Duration>,
}

impl EngineConfig {
    /// Computes the rounding tolerance `τ` for a day's raw total, per
    /// `tolerance_factor · |raw_total|`.
    #[must_use]
    pub fn tolerance_for(&self, raw_total: Decimal) -> Decimal {
        raw_total.abs() * self.tolerance_factor
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_days: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(4),
            tolerance_factor: default_tolerance(Decimal::ONE),
            retry: RetryConfig::default(),
            run_deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_for() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerance_for(dec!(1_000_000)), dec!(1));
    }
}
