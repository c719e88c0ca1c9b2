//! Notebook CLI - Command-line tool for a notebook backend
//!
//! Ask questions with live streaming answers, chat in persistent sessions
//! and browse notebooks, sources, notes, podcasts and insights.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notebook_client::NotebookClient;
use notebook_core::{DEFAULT_MINIMUM_SCORE, DEFAULT_SEARCH_LIMIT};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{ArgOverrides, Config};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "notebook-cli")]
#[command(author, version, about = "Notebook research assistant CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL [default: http://localhost:5055]
    #[arg(short, long, env = "NOTEBOOK_API_URL")]
    server: Option<String>,

    /// API password (sent as a bearer token)
    #[arg(long, env = "NOTEBOOK_API_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Notebook ID (with or without the `notebook:` prefix)
    #[arg(short, long, env = "NOTEBOOK_ID")]
    notebook: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "NOTEBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show the search plan while asking
    #[arg(long)]
    show_strategy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the answer (Ctrl+C cancels)
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Send a chat message in a notebook session
    Chat {
        /// The message
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Continue this session instead of the newest one
        #[arg(long, conflicts_with = "new")]
        session: Option<String>,

        /// Start a new session
        #[arg(long)]
        new: bool,
    },

    /// List notebooks
    Notebooks,

    /// List the sources of the notebook
    Sources,

    /// List the notes of the notebook
    Notes,

    /// List and manage chat sessions
    Sessions {
        /// Delete a session
        #[arg(long, value_name = "ID", group = "action")]
        delete: Option<String>,

        /// Create a session with this title
        #[arg(long, value_name = "TITLE", group = "action")]
        create: Option<String>,

        /// Show a session's messages
        #[arg(long, value_name = "ID", group = "action")]
        show: Option<String>,
    },

    /// Search sources and notes
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Semantic (vector) search instead of text search
        #[arg(long)]
        vector: bool,

        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,

        /// Minimum similarity score for vector search
        #[arg(long, default_value_t = DEFAULT_MINIMUM_SCORE)]
        min_score: f64,
    },

    /// List podcast episodes
    Podcasts {
        /// Download this episode's audio
        #[arg(long, value_name = "ID", requires = "out")]
        download: Option<String>,

        /// Where to save downloaded audio
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// List a source's insights
    Insights {
        /// Source ID
        source: String,

        /// Generate a new insight with this transformation first
        #[arg(long, value_name = "TRANSFORMATION")]
        generate: Option<String>,
    },

    /// List available transformations
    Transformations,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(ArgOverrides {
        server: cli.server.as_deref(),
        password: cli.password.as_deref(),
        notebook: cli.notebook.as_deref(),
        output: cli.output.map(OutputFormat::as_str),
        no_color: cli.no_color,
        show_strategy: cli.show_strategy,
    });

    // Create output context
    let format = OutputFormat::parse(&merged.output)?;
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    let client = NotebookClient::with_auth(&merged.server, merged.password.as_deref())
        .context("Failed to create notebook client")?;

    // Execute command
    match &cli.command {
        Commands::Ask { question } => {
            commands::ask(client, &question.join(" "), merged.show_strategy, &ctx).await?;
        }

        Commands::Chat {
            message,
            session,
            new,
        } => {
            let target = commands::ChatTarget {
                notebook: merged.require_notebook()?,
                session: session.as_deref(),
                new_session: *new,
                welcome_message: merged.welcome_message.as_deref(),
            };
            commands::chat(client, &message.join(" "), target, &ctx).await?;
        }

        Commands::Notebooks => {
            commands::notebooks(&client, &ctx).await?;
        }

        Commands::Sources => {
            commands::sources(&client, merged.require_notebook()?, &ctx).await?;
        }

        Commands::Notes => {
            commands::notes(&client, merged.require_notebook()?, &ctx).await?;
        }

        Commands::Sessions {
            delete,
            create,
            show,
        } => {
            let action = match (delete, create, show) {
                (Some(id), _, _) => commands::SessionAction::Delete(id),
                (_, Some(title), _) => commands::SessionAction::Create(title),
                (_, _, Some(id)) => commands::SessionAction::Show(id),
                _ => commands::SessionAction::List,
            };
            let notebook = match action {
                // Session IDs are global; no notebook needed
                commands::SessionAction::Delete(_) | commands::SessionAction::Show(_) => {
                    merged.notebook.as_deref().unwrap_or_default()
                }
                _ => merged.require_notebook()?,
            };
            commands::sessions(&client, notebook, action, &ctx).await?;
        }

        Commands::Search {
            query,
            vector,
            limit,
            min_score,
        } => {
            commands::search(&client, &query.join(" "), *vector, *limit, *min_score, &ctx).await?;
        }

        Commands::Podcasts { download, out } => {
            let download = download.as_deref().zip(out.as_deref());
            commands::podcasts(&client, download, &ctx).await?;
        }

        Commands::Insights { source, generate } => {
            commands::insights(&client, source, generate.as_deref(), &ctx).await?;
        }

        Commands::Transformations => {
            commands::transformations(&client, &ctx).await?;
        }
    }

    Ok(())
}
