//! Streaming ask support
//!
//! The backend answers questions over a server-sent event stream: it first
//! announces its search plan, then sends the final answer. [`AskClient`]
//! turns that stream into an ordered conversation log.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use notebook_client::ask::{AskClient, AskOptions};
//! use notebook_client::NotebookClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NotebookClient::new("http://localhost:5055")?;
//! let ask = Arc::new(AskClient::new(client, AskOptions::default()));
//!
//! let mut patches = ask.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(patch) = patches.recv().await {
//!         println!("{:?}", patch);
//!     }
//! });
//!
//! ask.submit("What is ownership?").await;
//! if let Some(error) = ask.error() {
//!     eprintln!("{}", error);
//! }
//! # Ok(())
//! # }
//! ```

mod log;
mod parser;
mod session;
mod stream;
mod turn;
mod types;

pub use log::{LogPatch, MessageLog};
pub use parser::DataLineParser;
pub use session::{AskClient, AskOptions, GENERIC_ASK_ERROR};
pub use stream::{AskEventStream, AskStream, AskTransport};
pub use turn::{Turn, TurnOutcome, TurnPhase, TurnStep};
pub use types::{AskStreamEvent, StrategyData, StreamError, StreamResult, DEFAULT_BACKEND_ERROR};
