//! Search command - text and vector search

use anyhow::Result;
use notebook_client::NotebookClient;
use notebook_core::{SearchRequest, SearchResultKind};

use crate::output::{truncate, OutputContext, SearchRow};

/// Search sources and notes
pub async fn search(
    client: &NotebookClient,
    query: &str,
    vector: bool,
    limit: u32,
    minimum_score: f64,
    ctx: &OutputContext,
) -> Result<()> {
    let response = if vector {
        client.vector_search(query, limit, minimum_score).await?
    } else {
        client
            .search(&SearchRequest {
                limit: Some(limit),
                ..SearchRequest::text(query)
            })
            .await?
    };

    if response.results.is_empty() {
        ctx.info("No results");
        return Ok(());
    }

    let rows: Vec<SearchRow> = response
        .results
        .into_iter()
        .map(|r| SearchRow {
            id: r.id,
            kind: match r.kind {
                SearchResultKind::Source => "source".to_string(),
                SearchResultKind::Note => "note".to_string(),
            },
            title: truncate(&r.title),
            score: format!("{:.2}", r.score),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
