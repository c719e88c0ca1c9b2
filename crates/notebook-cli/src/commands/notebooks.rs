//! Notebook, source and note listings

use anyhow::Result;
use notebook_client::NotebookClient;

use crate::output::{or_dash, truncate, NoteRow, NotebookRow, OutputContext, SourceRow};

/// List all notebooks
pub async fn notebooks(client: &NotebookClient, ctx: &OutputContext) -> Result<()> {
    let notebooks = client.list_notebooks().await?;

    let rows: Vec<NotebookRow> = notebooks
        .into_iter()
        .map(|n| NotebookRow {
            id: n.id,
            name: n.name,
            description: or_dash(n.description.as_deref().map(truncate)),
            updated: n.updated,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// List the sources of a notebook
pub async fn sources(client: &NotebookClient, notebook: &str, ctx: &OutputContext) -> Result<()> {
    let sources = client.list_sources(notebook).await?;

    let rows: Vec<SourceRow> = sources
        .into_iter()
        .map(|s| SourceRow {
            id: s.id,
            title: truncate(&s.title),
            asset_type: or_dash(Some(s.asset_type)),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// List the notes of a notebook
pub async fn notes(client: &NotebookClient, notebook: &str, ctx: &OutputContext) -> Result<()> {
    let notes = client.list_notes(notebook).await?;

    let rows: Vec<NoteRow> = notes
        .into_iter()
        .map(|n| NoteRow {
            id: n.id,
            title: truncate(&n.title),
            note_type: or_dash(n.note_type),
            content: truncate(&n.content),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
