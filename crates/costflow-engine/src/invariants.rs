//! Numeric invariant checks applied after a day's propagation.

use rust_decimal::Decimal;

use costflow_core::types::validate_share;
use costflow_core::{Dimension, NodeId};

use crate::error::EngineError;

/// Asserts `total == direct + indirect` exactly (decimal equality, no
/// tolerance — this must hold by construction).
///
/// # Errors
///
/// Returns `EngineError::InvariantViolation` if the decomposition does
/// not hold exactly.
pub fn check_total_decomposition(
    node: NodeId,
    dimension: &Dimension,
    direct: Decimal,
    indirect: Decimal,
    total: Decimal,
) -> Result<(), EngineError> {
    if direct + indirect != total {
        return Err(EngineError::InvariantViolation {
            kind: "total_decomposition",
            detail: format!(
                "node {node} dimension {dimension}: total={total} but direct+indirect={}",
                direct + indirect
            ),
        });
    }
    Ok(())
}

/// Asserts a parent's outgoing shares for one dimension sum to no more
/// than `1 + tolerance`.
///
/// # Errors
///
/// Returns `EngineError::ShareSumExceedsOne` if the sum is over budget.
pub fn check_share_sum(
    node: NodeId,
    dimension: &Dimension,
    share_sum: Decimal,
    tolerance: Decimal,
) -> Result<(), EngineError> {
    if share_sum > Decimal::ONE + tolerance {
        return Err(EngineError::ShareSumExceedsOne {
            node: node.to_string(),
            dimension: dimension.to_string(),
            sum: share_sum,
        });
    }
    Ok(())
}

/// Asserts conservation across the final cost centres of one date and
/// dimension: `Σ total(final cost centres) + unallocated == Σ direct(all
/// nodes)`, to within `tolerance`.
///
/// # Errors
///
/// Returns `EngineError::InvariantViolation` if conservation fails to
/// hold within `tolerance`.
pub fn check_conservation(
    dimension: &Dimension,
    final_cost_centre_total: Decimal,
    unallocated: Decimal,
    raw_direct_total: Decimal,
    tolerance: Decimal,
) -> Result<(), EngineError> {
    let lhs = final_cost_centre_total + unallocated;
    let delta = (lhs - raw_direct_total).abs();
    if delta > tolerance {
        return Err(EngineError::InvariantViolation {
            kind: "conservation",
            detail: format!(
                "dimension {dimension}: final+unallocated={lhs} raw_direct_total={raw_direct_total} delta={delta} > tolerance={tolerance}"
            ),
        });
    }
    Ok(())
}

/// Asserts a share lies in `[0, 1 + tolerance]`, per `Node`/edge share
/// bounds. A share below `-tolerance` or above `1 + tolerance` is a
/// configuration error rather than rounding noise.
///
/// # Errors
///
/// Returns `EngineError::InvariantViolation` if `share` is out of bounds.
pub fn check_share_bounds(share: Decimal, tolerance: Decimal) -> Result<(), EngineError> {
    validate_share(share, tolerance).map(|_| ()).map_err(|_| EngineError::InvariantViolation {
        kind: "share_bounds",
        detail: format!("share {share} outside [0,1] beyond tolerance {tolerance}"),
    })
}
