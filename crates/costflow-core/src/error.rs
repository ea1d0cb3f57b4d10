//! Error types shared by every layer of Costflow.
//!
//! This module defines the foundational error type. Higher-level crates
//! (`costflow-graph`, `costflow-strategy`, `costflow-engine`) define their
//! own `thiserror` enums and convert into/out of this one rather than
//! reusing it directly, matching the teacher's per-crate error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

/// A specialized `Result` type for Costflow core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The foundational error type for Costflow.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// An invalid calendar date was supplied.
    #[error("invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A decimal amount failed validation (e.g. negative where non-negative
    /// is required).
    #[error("invalid amount: {value} - {reason}")]
    InvalidAmount {
        /// The offending value.
        value: Decimal,
        /// Reason it is invalid.
        reason: String,
    },

    /// An identifier string could not be parsed into its typed form.
    #[error("invalid identifier: {value} - {reason}")]
    InvalidId {
        /// The offending value.
        value: String,
        /// Reason it is invalid.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid-date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid-amount error.
    #[must_use]
    pub fn invalid_amount(value: Decimal, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            value,
            reason: reason.into(),
        }
    }

    /// Creates an invalid-identifier error.
    #[must_use]
    pub fn invalid_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_date("2024-02-30 is not a valid date");
        assert!(err.to_string().contains("invalid date"));
    }
}
