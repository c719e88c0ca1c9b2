//! Output formatting for notebook-cli (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use notebook_core::{EnhancedChatMessage, Message, Role};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Cells longer than this are shortened in tables
const MAX_CELL_CHARS: usize = 60;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }

    /// Parse a format name from the config file
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        <Self as ValueEnum>::from_str(name, true).map_err(|_| {
            anyhow::anyhow!(
                "Unknown output format: {} (expected table, json or csv)",
                name
            )
        })
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    let table = Table::new(data).to_string();
                    println!("{}", table);
                }
            }
            OutputFormat::Json => self.print_json(data),
            OutputFormat::Csv => print_csv(data),
        }
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to serialize output: {}", e)),
        }
    }

    /// Print one conversation message as it would appear in a chat panel
    pub fn print_message(&self, message: &Message) {
        match message.role {
            Role::Human => println!("{} {}", "You:".bold(), message.content),
            Role::Ai => println!("{}\n", message.content),
            Role::Strategy => println!("{}", message.content.dimmed()),
            Role::Searching => {
                if !self.quiet {
                    println!("{}", message.content.yellow());
                }
            }
        }
    }

    /// Print a chat message including the web pages it drew on
    pub fn print_chat_message(&self, message: &EnhancedChatMessage) {
        let inner = &message.message;
        match inner.role {
            Role::Human => println!("{} {}", "You:".bold(), inner.content),
            _ => println!("{}", inner.content),
        }

        if message.is_web_enhanced == Some(true) {
            for source in message.web_sources.iter().flatten() {
                println!("  {} {} ({})", "↳".dimmed(), source.title, source.url.underline());
            }
        }
    }
}

/// Print data as CSV
fn print_csv<T: Serialize>(data: &[T]) {
    if data.is_empty() {
        return;
    }

    // Get field names from the first item
    let first = serde_json::to_value(&data[0]).unwrap_or_default();
    if let serde_json::Value::Object(map) = &first {
        let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
        println!("{}", headers.join(","));

        for item in data {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
                let values: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        row.get(*h)
                            .map(|v| match v {
                                serde_json::Value::String(s) => escape_csv(s),
                                other => escape_csv(&other.to_string()),
                            })
                            .unwrap_or_default()
                    })
                    .collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Shorten text for a table cell, on one line
pub fn truncate(text: &str) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= MAX_CELL_CHARS {
        line
    } else {
        let cut: String = line.chars().take(MAX_CELL_CHARS - 1).collect();
        format!("{}…", cut)
    }
}

pub fn or_dash(value: Option<String>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Notebook display for notebooks command
#[derive(Debug, Tabled, Serialize)]
pub struct NotebookRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

/// Source display for sources command
#[derive(Debug, Tabled, Serialize)]
pub struct SourceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Type")]
    pub asset_type: String,
}

/// Note display for notes command
#[derive(Debug, Tabled, Serialize)]
pub struct NoteRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Type")]
    pub note_type: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

/// Chat session display for sessions command
#[derive(Debug, Tabled, Serialize)]
pub struct SessionRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Messages")]
    pub messages: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

/// Message display for `sessions --show`
#[derive(Debug, Tabled, Serialize)]
pub struct MessageRow {
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

/// Result display for search command
#[derive(Debug, Tabled, Serialize)]
pub struct SearchRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Score")]
    pub score: String,
}

/// Episode display for podcasts command
#[derive(Debug, Tabled, Serialize)]
pub struct EpisodeRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Profile")]
    pub profile: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Audio")]
    pub audio: String,
}

/// Insight display for insights command
#[derive(Debug, Tabled, Serialize)]
pub struct InsightRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub insight_type: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

/// Transformation display for transformations command
#[derive(Debug, Tabled, Serialize)]
pub struct TransformationRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Description")]
    pub description: String,
}
