//! CLI error types.

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid date format.
    #[error("invalid date: {0}. Use YYYY-MM-DD.")]
    InvalidDate(String),

    /// The run window's end date precedes its start date.
    #[error("window end {end} precedes window start {start}")]
    InvalidWindow {
        /// The window's start date, as given.
        start: String,
        /// The window's end date, as given.
        end: String,
    },

    /// No dimensions were given and the built-in demo scenario could not
    /// supply a default.
    #[error("at least one --dimension is required")]
    MissingDimension,

    /// The scenario file could not be read or did not parse.
    #[error("scenario file {path}: {source}")]
    Scenario {
        /// Path to the offending scenario file.
        path: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// The engine run failed.
    #[error("run failed: {0}")]
    Engine(#[from] costflow_engine::EngineError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run's report could not be serialized for output.
    #[error("failed to print output: {0}")]
    Output(#[source] anyhow::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
