//! Errors raised while parsing or evaluating a strategy.

use thiserror::Error;

/// Errors raised while parsing or evaluating a strategy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// The strategy name is not one of the closed catalogue's members.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// The strategy's parameters failed validation.
    #[error("invalid parameters for strategy {strategy}: {reason}")]
    InvalidStrategyParams {
        /// The strategy name.
        strategy: String,
        /// Why the parameters were rejected.
        reason: String,
    },
}

/// Convenience alias for strategy operation results.
pub type StrategyResult<T> = Result<T, StrategyError>;
