//! Decimal arithmetic helpers for monetary and share math.
//!
//! All monetary and share math in Costflow goes through `rust_decimal::Decimal`
//! — never binary floating point — per the engine's numeric invariants.
//! Shares are computed to full precision and only rounded at the
//! persistence boundary, using half-even rounding.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CoreError, CoreResult};

/// Internal working scale: at least 12 fractional digits, used for every
/// intermediate share/contribution computation.
pub const WORKING_SCALE: u32 = 12;

/// Minimum scale at which decimal amounts are persisted.
pub const PERSISTENCE_SCALE: u32 = 6;

/// Rounds `value` to `PERSISTENCE_SCALE` fractional digits using half-even
/// (banker's) rounding, the only point in the pipeline where rounding is
/// allowed to occur.
#[must_use]
pub fn round_for_persistence(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERSISTENCE_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Validates that a decimal amount is non-negative, as required for direct
/// costs and usage values.
///
/// # Errors
///
/// Returns `CoreError::InvalidAmount` if `value` is negative.
pub fn require_non_negative(value: Decimal, what: &str) -> CoreResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(CoreError::invalid_amount(
            value,
            format!("{what} must be non-negative"),
        ));
    }
    Ok(value)
}

/// Clamps a share (fraction of a parent's holistic cost) into `[0, 1]`,
/// returning an error if it falls meaningfully outside that range rather
/// than silently clamping — per the spec, a share outside `[0,1]` is a
/// configuration error, not a value to be coerced.
///
/// A small tolerance (`tolerance`) absorbs decimal rounding noise from
/// strategy arithmetic (e.g. `0.1 + 0.2 + 0.7` landing at
/// `1.0000000000000000001`).
///
/// # Errors
///
/// Returns `CoreError::InvalidAmount` if `share` is outside
/// `[-tolerance, 1 + tolerance]`.
pub fn validate_share(share: Decimal, tolerance: Decimal) -> CoreResult<Decimal> {
    if share < -tolerance || share > Decimal::ONE + tolerance {
        return Err(CoreError::invalid_amount(
            share,
            "share must lie in [0, 1]",
        ));
    }
    Ok(share.clamp(Decimal::ZERO, Decimal::ONE))
}

/// Default rounding tolerance used by invariant checks:
/// `1e-6 · raw_total`. Returns `Decimal::ZERO` if `raw_total` is zero,
/// since there is nothing to tolerate on an empty window.
#[must_use]
pub fn default_tolerance(raw_total: Decimal) -> Decimal {
    raw_total.abs() * Decimal::new(1, 6)
}
