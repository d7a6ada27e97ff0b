//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations detected by the pure survey core.
/// These are independent of infrastructure concerns.
///
/// A lookup that finds nothing is not an error; lookups return `Option`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid access pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("could not detect delimiter: export does not start with \"id\"")]
    DelimiterNotDetected,

    #[error("malformed export: {message}")]
    MalformedInput { message: String },

    #[error("multiple choice not available: {message}")]
    Precondition { message: String },

    #[error("property '{key}' is read-only")]
    ReadOnly { key: String },

    #[error("duplicate question id: {0}")]
    DuplicateQid(String),

    #[error("cycle detected in question hierarchy: {0}")]
    CycleDetected(String),
}

impl DomainError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
