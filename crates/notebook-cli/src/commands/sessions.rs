//! Sessions command - chat session management

use anyhow::Result;
use notebook_client::NotebookClient;
use notebook_core::{CreateSessionRequest, RecordKind};

use crate::output::{truncate, MessageRow, OutputContext, OutputFormat, SessionRow};

/// What to do with chat sessions
pub enum SessionAction<'a> {
    List,
    Show(&'a str),
    Create(&'a str),
    Delete(&'a str),
}

/// List and manage the chat sessions of a notebook
pub async fn sessions(
    client: &NotebookClient,
    notebook: &str,
    action: SessionAction<'_>,
    ctx: &OutputContext,
) -> Result<()> {
    match action {
        SessionAction::List => {
            let sessions = client.list_chat_sessions(notebook).await?;
            if sessions.is_empty() {
                ctx.info("No chat sessions found");
                return Ok(());
            }

            let rows: Vec<SessionRow> = sessions
                .into_iter()
                .map(|s| SessionRow {
                    id: s.id,
                    title: truncate(&s.title),
                    messages: s
                        .message_count
                        .map_or_else(|| "-".to_string(), |c| c.to_string()),
                    updated: s.updated,
                })
                .collect();
            ctx.print(&rows);
        }

        SessionAction::Show(id) => {
            let id = RecordKind::ChatSession.checked(id)?;
            let session = client.get_chat_session(&id).await?;

            if ctx.format == OutputFormat::Json {
                ctx.print_json(&session);
                return Ok(());
            }

            ctx.info(&format!("{} ({})", session.session.title, session.session.id));
            let rows: Vec<MessageRow> = session
                .messages
                .into_iter()
                .map(|m| MessageRow {
                    role: m.role.to_string(),
                    content: truncate(&m.content),
                })
                .collect();
            ctx.print(&rows);
        }

        SessionAction::Create(title) => {
            let session = client
                .create_chat_session(&CreateSessionRequest {
                    notebook_id: notebook.to_string(),
                    title: Some(title.to_string()),
                    model_override: None,
                })
                .await?;
            ctx.success(&format!("Created session {}", session.id));
        }

        SessionAction::Delete(id) => {
            let id = RecordKind::ChatSession.checked(id)?;
            client.delete_chat_session(&id).await?;
            ctx.success(&format!("Deleted session {}", id));
        }
    }

    Ok(())
}
