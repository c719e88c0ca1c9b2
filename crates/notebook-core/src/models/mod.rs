//! Shared data models for the notebook backend and the widget log

mod chat;
mod insight;
mod message;
mod notebook;
mod podcast;
mod search;

pub use chat::*;
pub use insight::*;
pub use message::*;
pub use notebook::*;
pub use podcast::*;
pub use search::*;
