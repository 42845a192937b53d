//! Error types for the fairaudit crate.

use thiserror::Error;

/// Top-level error type for audit operations.
///
/// `NoReferenceGroup` (all selection rates equal) is deliberately not a
/// variant here: it is a valid compliant state and is reported on the
/// verdict, not raised as a failure.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Malformed or empty dataset, column list, or annotation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Out-of-range threshold or rule parameter. Fatal at run start.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fewer datasets than the statistic requires (N >= 2).
    #[error("Insufficient sample: {0}")]
    InsufficientSample(String),

    /// A compliance group with zero population.
    #[error("Degenerate group: {0}")]
    DegenerateGroup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AuditError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn insufficient_sample(msg: impl Into<String>) -> Self {
        Self::InsufficientSample(msg.into())
    }

    pub fn degenerate_group(msg: impl Into<String>) -> Self {
        Self::DegenerateGroup(msg.into())
    }
}
