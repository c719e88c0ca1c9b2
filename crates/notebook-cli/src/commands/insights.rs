//! Insights and transformations

use anyhow::Result;
use notebook_client::NotebookClient;

use crate::output::{or_dash, truncate, InsightRow, OutputContext, TransformationRow};

/// List a source's insights, optionally generating a new one first
pub async fn insights(
    client: &NotebookClient,
    source: &str,
    generate: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    if let Some(transformation) = generate {
        ctx.info("Generating insight...");
        let insight = client.create_source_insight(source, transformation).await?;
        ctx.success(&format!("Created {} ({})", insight.id, insight.insight_type));
    }

    let insights = client.list_source_insights(source).await?;
    let rows: Vec<InsightRow> = insights
        .into_iter()
        .map(|i| InsightRow {
            id: i.id,
            insight_type: i.insight_type,
            content: truncate(&i.content),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// List the transformations that can produce insights
pub async fn transformations(client: &NotebookClient, ctx: &OutputContext) -> Result<()> {
    let transformations = client.list_transformations().await?;

    let rows: Vec<TransformationRow> = transformations
        .into_iter()
        .map(|t| TransformationRow {
            id: t.id,
            name: t.name,
            title: or_dash(t.title),
            description: or_dash(t.description.as_deref().map(truncate)),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
