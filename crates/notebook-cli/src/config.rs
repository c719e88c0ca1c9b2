//! Configuration file handling for notebook-cli

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use notebook_client::DEFAULT_BASE_URL;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default server URL
    pub server: Option<String>,
    /// API password, sent as a bearer token
    pub password: Option<String>,
    /// Default notebook ID
    pub notebook: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Show the backend's search plan while asking
    pub show_strategy: Option<bool>,
    /// Greeting shown for a fresh chat
    pub welcome_message: Option<String>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("notebook-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments (flags or env) over config file values
    pub fn merge_with_args(&self, args: ArgOverrides<'_>) -> MergedConfig {
        MergedConfig {
            server: args
                .server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            password: args
                .password
                .map(String::from)
                .or_else(|| self.password.clone())
                .filter(|p| !p.is_empty()),
            notebook: args
                .notebook
                .map(String::from)
                .or_else(|| self.notebook.clone()),
            output: args
                .output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "table".to_string()),
            no_color: args.no_color || self.no_color.unwrap_or(false),
            show_strategy: args.show_strategy || self.show_strategy.unwrap_or(false),
            welcome_message: self.welcome_message.clone(),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ArgOverrides<'a> {
    pub server: Option<&'a str>,
    pub password: Option<&'a str>,
    pub notebook: Option<&'a str>,
    pub output: Option<&'a str>,
    pub no_color: bool,
    pub show_strategy: bool,
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub password: Option<String>,
    pub notebook: Option<String>,
    pub output: String,
    pub no_color: bool,
    pub show_strategy: bool,
    pub welcome_message: Option<String>,
}

impl MergedConfig {
    /// The notebook to work on, or an error explaining how to pick one
    pub fn require_notebook(&self) -> Result<&str> {
        self.notebook
            .as_deref()
            .context("No notebook selected; pass --notebook or set NOTEBOOK_ID")
    }
}
