//! Primitive value types shared across the allocation engine.

mod amount;
mod currency;
mod date;
mod dimension;
mod ids;

pub use amount::{
    default_tolerance, require_non_negative, round_for_persistence, validate_share,
    PERSISTENCE_SCALE, WORKING_SCALE,
};
pub use currency::Currency;
pub use date::CostDate;
pub use dimension::{Dimension, Metric};
pub use ids::{EdgeId, NodeId, OverrideId, RunId};
