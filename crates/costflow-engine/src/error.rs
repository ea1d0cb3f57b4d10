//! Engine error taxonomy.

use thiserror::Error;

use costflow_core::CoreError;
use costflow_graph::GraphError;
use costflow_strategy::StrategyError;
use costflow_traits::RepositoryError;

/// The engine's error taxonomy. Every fatal error aborts the run and
/// marks it `failed`; see [`crate::coordinator`] for propagation policy.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The day's graph snapshot failed validation; see the attached
    /// report's `errors` for specifics.
    #[error("graph invalid for one or more days: {0}")]
    GraphInvalid(String),

    /// An edge's effective strategy parameters failed to parse.
    #[error("invalid strategy parameters: {0}")]
    InvalidStrategyParams(#[from] StrategyError),

    /// A parent's outgoing shares summed to more than `1 + ε`.
    #[error("share sum exceeds one for node {node} dimension {dimension}: {sum}")]
    ShareSumExceedsOne {
        /// The node whose outgoing shares were over-budget.
        node: String,
        /// The dimension being allocated.
        dimension: String,
        /// The offending sum.
        sum: rust_decimal::Decimal,
    },

    /// A referenced node does not exist in the snapshot.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A value failed a core-level validation check (e.g. a negative
    /// direct cost).
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] CoreError),

    /// No direct costs were found for the requested window; non-fatal,
    /// recorded as a run warning rather than surfaced as this variant
    /// propagating to failure.
    #[error("no direct costs found for window {0}")]
    NoDirectCostsForWindow(String),

    /// A numeric invariant was violated after propagation.
    #[error("invariant violation ({kind}): {detail}")]
    InvariantViolation {
        /// Which invariant failed: `conservation`, `total_decomposition`,
        /// or `share_bounds`.
        kind: &'static str,
        /// Human-readable detail.
        detail: String,
    },

    /// The repository layer failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The run was cancelled before completion.
    #[error("run cancelled: {0}")]
    Cancelled(String),

    /// A day task could not complete after exhausting its retry budget.
    #[error("transient failure exhausted retries: {0}")]
    RetriesExhausted(String),

    /// Catch-all for failures that do not fit the above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GraphError> for EngineError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::CycleDetected => EngineError::GraphInvalid("cycle detected".into()),
            other => EngineError::GraphInvalid(other.to_string()),
        }
    }
}

impl EngineError {
    /// Whether the coordinator should retry the day that produced this
    /// error, rather than aborting the run outright.
    ///
    /// Only transient repository failures (`Io`, `Transaction`) qualify —
    /// validation and invariant errors are deterministic, so retrying
    /// them would just burn the retry budget on a guaranteed repeat
    /// failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Repository(RepositoryError::Io(_) | RepositoryError::Transaction(_))
        )
    }
}

/// Convenience alias for engine operation results.
pub type EngineResult<T> = Result<T, EngineError>;
