//! # Costflow Core
//!
//! Core value types and error primitives shared across the cost
//! attribution engine.
//!
//! This crate provides the foundational building blocks used throughout
//! Costflow:
//!
//! - **Types**: `CostDate`, `Currency`, `Dimension`, `Metric`, and the
//!   opaque identifier newtypes (`NodeId`, `EdgeId`, `OverrideId`, `RunId`)
//! - **Decimal helpers**: rounding, share validation, and tolerance
//!   computation shared by every downstream crate doing allocation math
//!
//! ## Design Philosophy
//!
//! - **Type Safety**: newtypes prevent mixing incompatible identifiers and
//!   values
//! - **Explicit Over Implicit**: all monetary and share arithmetic goes
//!   through `rust_decimal::Decimal`, never binary floating point
//!
//! ## Example
//!
//! ```rust
//! use costflow_core::prelude::*;
//!
//! let day = CostDate::from_ymd(2024, 1, 1).unwrap();
//! let node = NodeId::new();
//! assert_eq!(day.add_days(1).day(), 2);
//! let _ = node;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{
        default_tolerance, require_non_negative, round_for_persistence, validate_share,
        CostDate, Currency, Dimension, EdgeId, Metric, NodeId, OverrideId, RunId,
        PERSISTENCE_SCALE, WORKING_SCALE,
    };
}

// Re-export commonly used types at crate root.
pub use error::{CoreError, CoreResult};
pub use types::{CostDate, Currency, Dimension, EdgeId, Metric, NodeId, OverrideId, RunId};
