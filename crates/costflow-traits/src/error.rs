//! Error type for repository operations.

use thiserror::Error;

/// Common error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write conflicts with an entity that already exists, e.g. two runs
    /// attempting to write the same `(run_id, node_id, date, dimension)` row.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input failed basic validation before it reached the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying I/O failed; callers may retry transient instances of this.
    #[error("io error: {0}")]
    Io(String),

    /// Serialization or deserialization of a stored value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A transactional scope could not be committed or rolled back cleanly.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Catch-all for failures that do not fit the above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(e: std::io::Error) -> Self {
        RepositoryError::Io(e.to_string())
    }
}

/// Convenience alias for repository operation results.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
