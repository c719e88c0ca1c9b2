//! Command implementations for notebook-cli

pub mod ask;
pub mod chat;
pub mod insights;
pub mod notebooks;
pub mod podcasts;
pub mod search;
pub mod sessions;

pub use ask::ask;
pub use chat::{chat, ChatTarget};
pub use insights::{insights, transformations};
pub use notebooks::{notebooks, notes, sources};
pub use podcasts::podcasts;
pub use search::search;
pub use sessions::{sessions, SessionAction};
