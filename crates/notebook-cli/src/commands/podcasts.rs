//! Podcasts command - generated episodes

use std::path::Path;

use anyhow::{Context, Result};
use notebook_client::NotebookClient;
use notebook_core::{resolve_audio_url, EpisodeStatus};

use crate::output::{or_dash, EpisodeRow, OutputContext};

/// List podcast episodes, or download one episode's audio
pub async fn podcasts(
    client: &NotebookClient,
    download: Option<(&str, &Path)>,
    ctx: &OutputContext,
) -> Result<()> {
    if let Some((episode, path)) = download {
        let audio = client.fetch_podcast_audio(episode).await?;
        std::fs::write(path, &audio)
            .with_context(|| format!("Failed to write audio file: {}", path.display()))?;
        ctx.success(&format!("Saved {} bytes to {}", audio.len(), path.display()));
        return Ok(());
    }

    let episodes = client.list_podcast_episodes().await?;
    let base = client.base_url().as_str();

    let rows: Vec<EpisodeRow> = episodes
        .into_iter()
        .map(|e| {
            let audio = if e.is_playable() {
                e.audio_path().and_then(|p| resolve_audio_url(base, p))
            } else {
                None
            };
            EpisodeRow {
                status: status_label(e.job_status).to_string(),
                profile: e.episode_profile.name,
                audio: or_dash(audio),
                id: e.id,
                name: e.name,
            }
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

fn status_label(status: Option<EpisodeStatus>) -> &'static str {
    match status.unwrap_or_default() {
        EpisodeStatus::Completed => "completed",
        EpisodeStatus::Running | EpisodeStatus::Processing => "generating",
        EpisodeStatus::Pending | EpisodeStatus::Submitted => "queued",
        EpisodeStatus::Failed | EpisodeStatus::Error => "failed",
        EpisodeStatus::Unknown => "unknown",
    }
}
