//! Conversation log and the patches that mutate it

use notebook_core::{Message, Role};
use tracing::warn;

/// A single mutation of a [`MessageLog`]
///
/// Every change the ask client makes goes through a patch, so consumers can
/// mirror the log incrementally and tests can assert on what changed.
#[derive(Debug, Clone, PartialEq)]
pub enum LogPatch {
    /// Append at the end
    Append(Message),
    /// Remove every entry with this role
    RemoveRole(Role),
    /// Swap the entry with `id` for `message`, keeping its position
    Replace { id: String, message: Message },
    /// Drop everything
    Clear,
    /// Replace the whole log (e.g. loading a stored conversation)
    ReplaceAll(Vec<Message>),
}

/// Ordered, append-only (apart from patches) list of messages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn has_indicator(&self) -> bool {
        self.messages.iter().any(Message::is_indicator)
    }

    /// Append a message.
    ///
    /// Refuses duplicate IDs, which also makes a second searching indicator
    /// a no-op. Returns whether the log changed.
    pub fn append(&mut self, message: Message) -> bool {
        if self.get(&message.id).is_some() {
            if !message.is_indicator() {
                warn!("Refusing to append duplicate message id {}", message.id);
            }
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Remove all messages matching `pred`, returning how many were removed
    pub fn remove_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&Message) -> bool,
    {
        let before = self.messages.len();
        self.messages.retain(|m| !pred(m));
        before - self.messages.len()
    }

    /// Replace the message with `id` in place
    pub fn replace_by_id(&mut self, id: &str, message: Message) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                *slot = message;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.messages.is_empty();
        self.messages.clear();
        changed
    }

    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        for message in messages {
            self.append(message);
        }
    }

    /// Apply one patch; returns whether the log changed
    pub fn apply(&mut self, patch: &LogPatch) -> bool {
        match patch {
            LogPatch::Append(message) => self.append(message.clone()),
            LogPatch::RemoveRole(role) => self.remove_where(|m| m.role == *role) > 0,
            LogPatch::Replace { id, message } => self.replace_by_id(id, message.clone()),
            LogPatch::Clear => self.clear(),
            LogPatch::ReplaceAll(messages) => {
                self.replace_all(messages.clone());
                true
            }
        }
    }
}

impl From<Vec<Message>> for MessageLog {
    fn from(messages: Vec<Message>) -> Self {
        let mut log = Self::new();
        log.replace_all(messages);
        log
    }
}
