//! Common error types for notebook models

use thiserror::Error;

/// Result type for model conversions
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while interpreting backend records
#[derive(Debug, Error)]
pub enum ModelError {
    /// Record ID carries the prefix of a different table
    #[error("Expected a {expected} ID, got: {actual}")]
    WrongRecordKind {
        /// Table the caller asked for
        expected: &'static str,
        /// The offending ID
        actual: String,
    },

    /// Role string not recognised
    #[error("Unknown message role: {0}")]
    UnknownRole(String),
}
