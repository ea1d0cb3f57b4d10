//! # Costflow Traits
//!
//! Data model and repository trait contracts for the cost attribution
//! engine.
//!
//! This crate provides the foundational contracts used throughout
//! Costflow:
//!
//! - **Model**: the persisted entity shapes (`Node`, `Edge`,
//!   `EdgeStrategyOverride`, `DirectCost`, `UsageSample`, `Run`,
//!   `AllocationResult`, `ContributionResult`)
//! - **Repository**: narrow async contracts over each entity kind, plus a
//!   [`repository::TransactionScope`] for atomic run commits
//!
//! Storage implementations (in-memory, relational, document store, ...)
//! are extensions that implement these traits; this crate has no runtime
//! storage dependencies of its own.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod model;
pub mod repository;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{RepositoryError, RepositoryResult};
    pub use crate::model::{
        AllocationResult, ContributionResult, DirectCost, Edge, EdgeStrategyOverride, Labels,
        Node, NodeType, Run, RunStatus, StrategySpec, UsageSample,
    };
    pub use crate::repository::{
        CostRepository, EdgeRepository, LabelFilter, NodeRepository, Repositories, RunRepository,
        StrategyOverrideRepository, TransactionScope, UsageRepository,
    };
}

pub use error::{RepositoryError, RepositoryResult};
pub use model::{
    AllocationResult, ContributionResult, DirectCost, Edge, EdgeStrategyOverride, Node, NodeType,
    Run, RunStatus, StrategySpec, UsageSample,
};
pub use repository::{
    CostRepository, EdgeRepository, LabelFilter, NodeRepository, Repositories, RunRepository,
    StrategyOverrideRepository, TransactionScope, UsageRepository,
};
