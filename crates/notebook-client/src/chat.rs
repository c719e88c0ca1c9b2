//! Session-based chat state
//!
//! [`ChatController`] keeps the conversation shown in a chat panel in sync
//! with the backend's chat sessions. Every operation records a user-facing
//! error message instead of returning one; the details go to the log.

use async_trait::async_trait;
use notebook_core::{
    BuildContextRequest, BuildContextResponse, ChatContext, ChatMessage, ChatSession,
    ChatSessionWithMessages, ContextConfig, CreateSessionRequest, EnhancedChatMessage, Note,
    Role, SendMessageRequest, SendMessageResponse, Source, WELCOME_MESSAGE_ID,
};
use tracing::{debug, error, instrument, warn};

use crate::client::NotebookClient;
use crate::error::Result;

/// Shown when a chat message could not be delivered
pub const SEND_FAILED_MESSAGE: &str = "Failed to send message. Please try again.";

/// Titles of sessions created from a first message are cut to this many characters
const SESSION_TITLE_CHARS: usize = 50;

/// Context inclusion level requested for every source
const SOURCE_CONTEXT_LEVEL: &str = "insights";
/// Context inclusion level requested for every note
const NOTE_CONTEXT_LEVEL: &str = "full content";

/// Backend calls the chat controller depends on
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_sources(&self, notebook_id: &str) -> Result<Vec<Source>>;
    async fn list_notes(&self, notebook_id: &str) -> Result<Vec<Note>>;
    async fn build_context(&self, request: &BuildContextRequest) -> Result<BuildContextResponse>;
    async fn list_chat_sessions(&self, notebook_id: &str) -> Result<Vec<ChatSession>>;
    async fn create_chat_session(&self, request: &CreateSessionRequest) -> Result<ChatSession>;
    async fn get_chat_session(&self, session_id: &str) -> Result<ChatSessionWithMessages>;
    async fn delete_chat_session(&self, session_id: &str) -> Result<()>;
    async fn send_chat_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse>;
}

#[async_trait]
impl ChatBackend for NotebookClient {
    async fn list_sources(&self, notebook_id: &str) -> Result<Vec<Source>> {
        NotebookClient::list_sources(self, notebook_id).await
    }

    async fn list_notes(&self, notebook_id: &str) -> Result<Vec<Note>> {
        NotebookClient::list_notes(self, notebook_id).await
    }

    async fn build_context(&self, request: &BuildContextRequest) -> Result<BuildContextResponse> {
        NotebookClient::build_context(self, request).await
    }

    async fn list_chat_sessions(&self, notebook_id: &str) -> Result<Vec<ChatSession>> {
        NotebookClient::list_chat_sessions(self, notebook_id).await
    }

    async fn create_chat_session(&self, request: &CreateSessionRequest) -> Result<ChatSession> {
        NotebookClient::create_chat_session(self, request).await
    }

    async fn get_chat_session(&self, session_id: &str) -> Result<ChatSessionWithMessages> {
        NotebookClient::get_chat_session(self, session_id).await
    }

    async fn delete_chat_session(&self, session_id: &str) -> Result<()> {
        NotebookClient::delete_chat_session(self, session_id).await
    }

    async fn send_chat_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse> {
        NotebookClient::send_chat_message(self, request).await
    }
}

/// Chat panel state for one notebook
pub struct ChatController<B> {
    backend: B,
    notebook_id: String,
    welcome_message: Option<String>,
    messages: Vec<EnhancedChatMessage>,
    sessions: Vec<ChatSession>,
    current_session: Option<ChatSession>,
    context: ChatContext,
    sources: Vec<Source>,
    notes: Vec<Note>,
    error: Option<String>,
}

impl<B: ChatBackend> ChatController<B> {
    pub fn new(backend: B, notebook_id: impl Into<String>) -> Self {
        Self {
            backend,
            notebook_id: notebook_id.into(),
            welcome_message: None,
            messages: Vec::new(),
            sessions: Vec::new(),
            current_session: None,
            context: ChatContext::default(),
            sources: Vec::new(),
            notes: Vec::new(),
            error: None,
        }
    }

    /// Greeting shown whenever no conversation is open
    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = Some(message.into());
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notebook_id(&self) -> &str {
        &self.notebook_id
    }

    pub fn messages(&self) -> &[EnhancedChatMessage] {
        &self.messages
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current_session.as_ref()
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Load notebook data, build the chat context and open the newest session.
    ///
    /// Missing sources, notes or context degrade to empty values. With no
    /// sessions the welcome message is shown.
    #[instrument(skip(self), fields(notebook_id = %self.notebook_id))]
    pub async fn initialize(&mut self) {
        self.error = None;
        self.load_notebook_data().await;
        self.refresh_sessions().await;

        match self.sessions.first().map(|s| s.id.clone()) {
            Some(id) => {
                if let Err(e) = self.load_session(&id).await {
                    error!("Failed to load session messages: {}", e);
                    self.error = Some("Failed to load chat history".into());
                }
            }
            None => self.show_welcome(),
        }
    }

    async fn load_notebook_data(&mut self) {
        let (sources, notes) = futures::join!(
            self.backend.list_sources(&self.notebook_id),
            self.backend.list_notes(&self.notebook_id),
        );
        self.sources = sources.unwrap_or_else(|e| {
            warn!("Failed to load sources: {}", e);
            Vec::new()
        });
        self.notes = notes.unwrap_or_else(|e| {
            warn!("Failed to load notes: {}", e);
            Vec::new()
        });

        if self.sources.is_empty() && self.notes.is_empty() {
            return;
        }

        let request = BuildContextRequest {
            notebook_id: self.notebook_id.clone(),
            context_config: ContextConfig {
                sources: self
                    .sources
                    .iter()
                    .map(|s| (s.id.clone(), SOURCE_CONTEXT_LEVEL.to_string()))
                    .collect(),
                notes: self
                    .notes
                    .iter()
                    .map(|n| (n.id.clone(), NOTE_CONTEXT_LEVEL.to_string()))
                    .collect(),
            },
        };
        self.context = match self.backend.build_context(&request).await {
            Ok(response) => response.context,
            Err(e) => {
                error!("Failed to build context: {}", e);
                ChatContext::default()
            }
        };
    }

    /// Reload the session list; failures leave it empty
    pub async fn refresh_sessions(&mut self) {
        self.sessions = match self.backend.list_chat_sessions(&self.notebook_id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                error!("Failed to load sessions: {}", e);
                Vec::new()
            }
        };
    }

    async fn load_session(&mut self, session_id: &str) -> Result<()> {
        let loaded = self.backend.get_chat_session(session_id).await?;
        self.messages = loaded.messages.into_iter().map(Into::into).collect();
        self.current_session = Some(loaded.session);
        Ok(())
    }

    /// Send a message, creating a session first if none is open.
    ///
    /// The message is shown right away and withdrawn again if the backend
    /// rejects it. On success the log is replaced by the backend's view of
    /// the conversation.
    #[instrument(skip(self, content))]
    pub async fn send_message(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }

        self.error = None;
        let optimistic = ChatMessage::local(Role::Human, content);
        let optimistic_id = optimistic.id.clone();
        self.messages.retain(|m| m.message.id != WELCOME_MESSAGE_ID);
        self.messages.push(optimistic.into());

        match self.deliver(content).await {
            Ok(messages) => self.messages = messages,
            Err(e) => {
                error!("Failed to send message: {}", e);
                self.error = Some(SEND_FAILED_MESSAGE.into());
                self.messages.retain(|m| m.message.id != optimistic_id);
            }
        }
    }

    async fn deliver(&mut self, content: &str) -> Result<Vec<EnhancedChatMessage>> {
        let session_id = match &self.current_session {
            Some(session) => session.id.clone(),
            None => {
                let title: String = content.chars().take(SESSION_TITLE_CHARS).collect();
                let session = self
                    .backend
                    .create_chat_session(&self.session_request(title))
                    .await?;
                debug!(session_id = %session.id, "Created chat session");
                self.sessions.insert(0, session.clone());
                let id = session.id.clone();
                self.current_session = Some(session);
                id
            }
        };

        let request = SendMessageRequest {
            session_id,
            message: content.to_string(),
            context: self.context.clone(),
            model_override: None,
            notebook_id: Some(self.notebook_id.clone()),
            enable_web_search: Some(true),
        };
        let response = self.backend.send_chat_message(&request).await?;
        Ok(response.messages)
    }

    /// Start a new, empty session and make it current
    #[instrument(skip(self))]
    pub async fn create_session(&mut self, title: Option<&str>) -> Result<ChatSession> {
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| format!("Chat {}", chrono::Local::now().format("%Y-%m-%d")));

        match self.backend.create_chat_session(&self.session_request(title)).await {
            Ok(session) => {
                self.sessions.insert(0, session.clone());
                self.current_session = Some(session.clone());
                self.messages.clear();
                Ok(session)
            }
            Err(e) => {
                error!("Failed to create session: {}", e);
                self.error = Some("Failed to create chat session".into());
                Err(e)
            }
        }
    }

    /// Open another session and show its messages
    #[instrument(skip(self))]
    pub async fn switch_session(&mut self, session_id: &str) {
        self.error = None;
        if let Err(e) = self.load_session(session_id).await {
            error!("Failed to switch session: {}", e);
            self.error = Some("Failed to switch session".into());
        }
    }

    /// Delete a session; deleting the open one returns to the welcome state
    #[instrument(skip(self))]
    pub async fn delete_session(&mut self, session_id: &str) {
        if let Err(e) = self.backend.delete_chat_session(session_id).await {
            error!("Failed to delete session: {}", e);
            self.error = Some("Failed to delete session".into());
            return;
        }

        self.sessions.retain(|s| s.id != session_id);
        if self
            .current_session
            .as_ref()
            .is_some_and(|s| s.id == session_id)
        {
            self.current_session = None;
            self.show_welcome();
        }
    }

    /// Start a new conversation (the next message opens a new session)
    pub fn clear_messages(&mut self) {
        self.current_session = None;
        self.show_welcome();
    }

    fn show_welcome(&mut self) {
        self.messages = self
            .welcome_message
            .as_ref()
            .map(|text| vec![ChatMessage::welcome(text.clone()).into()])
            .unwrap_or_default();
    }

    fn session_request(&self, title: String) -> CreateSessionRequest {
        CreateSessionRequest {
            notebook_id: self.notebook_id.clone(),
            title: Some(title),
            model_override: None,
        }
    }
}
