//! notebook-core - Core types for the notebook widget client
//!
//! This crate holds the models exchanged with the notebook backend and the
//! conversation log entries shown by the widget, plus the record ID helpers
//! the backend expects (`notebook:abc`, `chat_session:xyz`, ...).

pub mod error;
pub mod ids;
pub mod models;

pub use error::{ModelError, ModelResult};
pub use ids::RecordKind;
pub use models::*;
