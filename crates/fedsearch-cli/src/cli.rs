//! CLI argument parsing for fedsearch.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Federated space search
///
/// Searches every storage space a user can see and prints one ranked list.
#[derive(Parser, Debug)]
#[command(name = "fedsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/fedsearch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a search against a fixture of spaces and index hits
    Search(SearchArgs),

    /// Print the structured query a raw query normalizes to
    Normalize {
        /// Raw query text
        query: String,
    },
}

/// Arguments of the `search` command
#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Raw query text
    pub query: String,

    /// JSON fixture with spaces, grant paths and hits (default from config)
    #[arg(short, long)]
    pub fixtures: Option<String>,

    /// User to search as
    #[arg(short, long, default_value = "admin")]
    pub user: String,

    /// Restrict the search to one space (storage$space!opaque)
    #[arg(short, long)]
    pub space: Option<String>,

    /// Sub-path inside --space
    #[arg(long, requires = "space")]
    pub path: Option<String>,

    /// Maximum results (0 = configured default)
    #[arg(short = 'n', long, default_value = "0")]
    pub page_size: u32,

    /// Continuation token from a previous search
    #[arg(short = 't', long)]
    pub page_token: Option<String>,

    /// Filter passed through to the space listing (key=value, repeatable)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Print the response as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}
