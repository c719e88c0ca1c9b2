//! Ask command - streaming question answering

use std::sync::Arc;

use anyhow::{bail, Result};
use notebook_client::ask::{AskClient, AskOptions, LogPatch, TurnOutcome};
use notebook_client::NotebookClient;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

use crate::output::{OutputContext, OutputFormat};

/// Ask a question and render the answer as it streams in
pub async fn ask(
    client: NotebookClient,
    question: &str,
    show_strategy: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let ask = Arc::new(AskClient::new(
        client,
        AskOptions {
            show_strategy,
            ..Default::default()
        },
    ));

    let handler_ask = ask.clone();
    ctrlc::set_handler(move || handler_ask.cancel())?;

    let mut patches = ask.subscribe();
    let submit = ask.submit(question);
    tokio::pin!(submit);

    let live = ctx.format == OutputFormat::Table;
    loop {
        tokio::select! {
            biased;
            patch = patches.recv() => match patch {
                Ok(patch) if live => render_patch(&patch, ctx),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Renderer lagged"),
                Err(RecvError::Closed) => break,
            },
            () = &mut submit => break,
        }
    }

    // Patches sent right before submit returned
    loop {
        match patches.try_recv() {
            Ok(patch) if live => render_patch(&patch, ctx),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }

    if !live {
        ctx.print_json(&ask.messages());
    }

    if let Some(error) = ask.error() {
        bail!(error);
    }
    match ask.last_outcome() {
        Some(TurnOutcome::Cancelled) => ctx.warn("Cancelled"),
        Some(TurnOutcome::Ended) => ctx.warn("The answer stream ended without an answer"),
        _ => {}
    }

    Ok(())
}

fn render_patch(patch: &LogPatch, ctx: &OutputContext) {
    match patch {
        LogPatch::Append(message) | LogPatch::Replace { message, .. } => {
            ctx.print_message(message)
        }
        LogPatch::ReplaceAll(messages) => messages.iter().for_each(|m| ctx.print_message(m)),
        LogPatch::RemoveRole(_) | LogPatch::Clear => {}
    }
}
