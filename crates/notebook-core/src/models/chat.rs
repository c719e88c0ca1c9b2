//! Chat session models
//!
//! The backend speaks snake_case. Web-search metadata on chat messages is
//! re-exposed in camelCase (`isWebEnhanced`, `webSources`) for embedding
//! hosts, while still accepting the backend spelling on input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::message::Role;

/// Model used for chat execution when the caller does not pick one
pub const DEFAULT_CHAT_MODEL_ID: &str = "model:mmbufzrwj11zbcq7kqve";

/// ID of the synthetic greeting shown in an empty conversation
pub const WELCOME_MESSAGE_ID: &str = "welcome";

/// A persisted chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// Message created locally (not yet persisted by the backend)
    pub fn local(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// The greeting shown before the first exchange
    pub fn welcome(content: impl Into<String>) -> Self {
        Self {
            id: WELCOME_MESSAGE_ID.to_string(),
            ..Self::local(Role::Ai, content)
        }
    }
}

/// A web page consulted while answering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Chat message with optional web-search metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedChatMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    #[serde(
        default,
        rename = "webSources",
        alias = "web_sources",
        skip_serializing_if = "Option::is_none"
    )]
    pub web_sources: Option<Vec<WebSource>>,
    #[serde(
        default,
        rename = "isWebEnhanced",
        alias = "is_web_enhanced",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_web_enhanced: Option<bool>,
}

impl From<ChatMessage> for EnhancedChatMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            message,
            web_sources: None,
            is_web_enhanced: None,
        }
    }
}

/// Chat session summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<String>,
    pub created: String,
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
}

/// Chat session with its message history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSessionWithMessages {
    #[serde(flatten)]
    pub session: ChatSession,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub notebook_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
}

/// Context the backend injects into the chat prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub notes: Vec<serde_json::Value>,
}

impl ChatContext {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.notes.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub message: String,
    pub context: ChatContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_web_search: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub session_id: String,
    pub messages: Vec<EnhancedChatMessage>,
}

/// Which parts of each record to include in the chat context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Source ID -> inclusion level (e.g. "insights")
    pub sources: BTreeMap<String, String>,
    /// Note ID -> inclusion level (e.g. "full content")
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildContextRequest {
    pub notebook_id: String,
    pub context_config: ContextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildContextResponse {
    pub context: ChatContext,
    #[serde(default)]
    pub token_count: u64,
    #[serde(default)]
    pub char_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_web_metadata_accepts_snake_case() {
        let json = r#"{
            "id": "m1",
            "type": "ai",
            "content": "hello",
            "is_web_enhanced": true,
            "web_sources": [{"title": "Rust", "url": "https://rust-lang.org"}]
        }"#;
        let msg: EnhancedChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.is_web_enhanced, Some(true));
        assert_eq!(msg.web_sources.as_ref().unwrap()[0].title, "Rust");
        assert_eq!(msg.message.role, Role::Ai);
    }

    #[test]
    fn test_web_metadata_serializes_camel_case() {
        let msg = EnhancedChatMessage {
            message: ChatMessage::local(Role::Ai, "x"),
            web_sources: Some(vec![]),
            is_web_enhanced: Some(false),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("isWebEnhanced").is_some());
        assert!(value.get("webSources").is_some());
        assert!(value.get("is_web_enhanced").is_none());
    }

    #[test]
    fn test_session_with_messages_flattens() {
        let json = r#"{
            "id": "chat_session:1",
            "title": "T",
            "created": "2024-01-01",
            "updated": "2024-01-02",
            "messages": [{"id": "a", "type": "human", "content": "hi"}]
        }"#;
        let s: ChatSessionWithMessages = serde_json::from_str(json).unwrap();
        assert_eq!(s.session.id, "chat_session:1");
        assert_eq!(s.messages.len(), 1);
        assert_eq!(s.messages[0].timestamp, None);
    }

    #[test]
    fn test_welcome_message_id() {
        let w = ChatMessage::welcome("Hi!");
        assert_eq!(w.id, WELCOME_MESSAGE_ID);
        assert_eq!(w.role, Role::Ai);
    }
}
