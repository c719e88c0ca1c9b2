//! Types for the streaming ask endpoint

use notebook_core::{SearchStep, StrategyPlan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error text used when the backend reports a failure without detail
pub const DEFAULT_BACKEND_ERROR: &str = "An error occurred";

/// Search plan payload of a `strategy` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searches: Option<Vec<SearchStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ids: Option<Vec<String>>,
}

impl StrategyData {
    pub fn into_plan(self) -> StrategyPlan {
        StrategyPlan {
            reasoning: self.reasoning.unwrap_or_default(),
            searches: self.searches.unwrap_or_default(),
        }
    }
}

/// One record of the ask event stream, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AskStreamEvent {
    /// The backend announces the searches it is about to run
    Strategy {
        #[serde(default)]
        data: Option<StrategyData>,
    },
    /// Intermediate answer for one search (informational only)
    Answer {
        #[serde(default)]
        content: Option<String>,
    },
    /// The answer to show the user
    FinalAnswer {
        #[serde(default)]
        content: String,
    },
    /// Backend-side failure
    Error {
        #[serde(default)]
        content: Option<String>,
    },
    /// End of stream
    Complete,
}

impl AskStreamEvent {
    /// Value of the `type` discriminator, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AskStreamEvent::Strategy { .. } => "strategy",
            AskStreamEvent::Answer { .. } => "answer",
            AskStreamEvent::FinalAnswer { .. } => "final_answer",
            AskStreamEvent::Error { .. } => "error",
            AskStreamEvent::Complete => "complete",
        }
    }
}

/// Errors that can occur while opening or reading the ask stream
#[derive(Debug, Error)]
pub enum StreamError {
    /// HTTP/connection error
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Server returned a non-2xx response
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Transport-specific failure (non-HTTP transports)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request was cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,
}

/// Result type for streaming operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;
