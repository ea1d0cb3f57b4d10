//! Cost dimension and usage metric identifiers.
//!
//! These are operator-defined data (`instance_hours`, `storage_gb_month`,
//! `egress_gb`, `requests`, ...), not a closed enum compiled into the
//! engine — new dimensions and metrics are added by ingestion without a
//! code change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cost dimension, e.g. `instance_hours` or `egress_gb`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dimension(pub String);

impl Dimension {
    /// Creates a new dimension.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the dimension name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Dimension {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Dimension {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A usage metric, e.g. `cpu_hours` or `request_count`, consulted by
/// proportional strategies.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Metric(pub String);

impl Metric {
    /// Creates a new metric.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the metric name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Metric {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Metric {
    fn from(s: String) -> Self {
        Self(s)
    }
}
