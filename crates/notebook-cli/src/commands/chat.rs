//! Chat command - session-based conversation

use anyhow::{bail, Result};
use notebook_client::{ChatController, NotebookClient};
use notebook_core::{RecordKind, Role};

use crate::output::{OutputContext, OutputFormat};

/// Where to send a chat message
pub struct ChatTarget<'a> {
    pub notebook: &'a str,
    /// Continue this session instead of the newest one
    pub session: Option<&'a str>,
    /// Start a new session
    pub new_session: bool,
    pub welcome_message: Option<&'a str>,
}

/// Send a message and print the reply
pub async fn chat(
    client: NotebookClient,
    message: &str,
    target: ChatTarget<'_>,
    ctx: &OutputContext,
) -> Result<()> {
    let mut chat = ChatController::new(client, target.notebook);
    if let Some(welcome) = target.welcome_message {
        chat = chat.with_welcome_message(welcome);
    }

    chat.initialize().await;
    if let Some(error) = chat.error() {
        ctx.warn(error);
    }

    if target.new_session {
        chat.clear_messages();
        if let Some(welcome) = chat.messages().first() {
            ctx.info(&welcome.message.content);
        }
    } else if let Some(session) = target.session {
        let session = RecordKind::ChatSession.checked(session)?;
        chat.switch_session(&session).await;
        if let Some(error) = chat.error() {
            bail!("{}: {}", error, session);
        }
    }

    chat.send_message(message).await;
    if let Some(error) = chat.error() {
        bail!(error.to_string());
    }

    if let Some(session) = chat.current_session() {
        ctx.info(&format!("Session {} ({})", session.id, session.title));
    }

    // The backend returns the whole conversation; print the reply only
    let messages = chat.messages();
    let reply_start = messages
        .iter()
        .rposition(|m| m.message.role == Role::Human)
        .map_or(0, |i| i + 1);
    let reply = &messages[reply_start..];

    if ctx.format == OutputFormat::Json {
        ctx.print_json(reply);
    } else {
        reply.iter().for_each(|m| ctx.print_chat_message(m));
    }

    Ok(())
}
