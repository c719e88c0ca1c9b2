//! Notebook Client Library
//!
//! Typed access to a notebook backend: REST calls, the streaming ask
//! endpoint and the state containers behind a chat panel.
//!
//! # Example
//!
//! ```rust,no_run
//! use notebook_client::NotebookClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = NotebookClient::with_auth("http://localhost:5055", Some("secret"))?;
//!
//!     // IDs may be given with or without their table prefix
//!     let notebook = client.get_notebook("abc123").await?;
//!     let sources = client.list_sources(&notebook.id).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Streaming ask
//!
//! [`AskClient`] turns the server-sent event stream of `/api/search/ask`
//! into a message log. See the [`ask`] module.
//!
//! # Testing
//!
//! The `testing` module provides an in-process server and a scripted ask
//! transport:
//!
//! ```rust,ignore
//! use notebook_client::testing::TestServer;
//!
//! let server = TestServer::start(router).await?;
//! let notebooks = server.client.list_notebooks().await?;
//! ```

pub mod ask;
pub mod chat;
mod client;
mod error;
pub mod testing;

pub use client::{NotebookClient, DEFAULT_BASE_URL};
pub use error::{NotebookClientError, Result};

// Re-export ask and chat types for convenience
pub use ask::{
    AskClient, AskOptions, AskStream, AskStreamEvent, AskTransport, LogPatch, StreamError,
    TurnOutcome, TurnPhase,
};
pub use chat::{ChatBackend, ChatController};

// Re-export core types for convenience
pub use notebook_core::{Message, RecordKind, Role, StrategyPlan};
