//! fedsearch
//!
//! Federated search over every storage space a user can see.
//!
//! # Usage
//!
//! ```bash
//! fedsearch search <QUERY> --fixtures spaces.json [--space ID] [--path P] [-n N] [-t TOKEN] [--json]
//! fedsearch normalize <QUERY>
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/fedsearch/config.toml)
//! 3. Environment variables (FEDSEARCH_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use fedsearch_cli::{run_normalize, run_search, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => {
            run_search(cli.config.as_deref(), cli.log_level.as_deref(), args).await?;
        }
        Commands::Normalize { query } => {
            run_normalize(cli.config.as_deref(), cli.log_level.as_deref(), &query)?;
        }
    }

    Ok(())
}
