//! Error types for notebook client operations

use thiserror::Error;

/// Result type alias for notebook client operations
pub type Result<T> = std::result::Result<T, NotebookClientError>;

/// Errors that can occur during notebook client operations
#[derive(Error, Debug)]
pub enum NotebookClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Base URL cannot carry path segments (e.g. `mailto:`)
    #[error("Base URL cannot be used for API paths: {0}")]
    InvalidBaseUrl(String),

    /// Server returned an error response
    #[error("API Error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong API password
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Record ID of the wrong kind
    #[error(transparent)]
    InvalidId(#[from] notebook_core::ModelError),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl NotebookClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }
}
