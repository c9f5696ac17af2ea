//! fedsearch CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (search, normalize)
//! - `fixture`: JSON fixture backend for the collaborator traits

pub mod cli;
pub mod commands;
pub mod fixture;

pub use cli::{Cli, Commands, SearchArgs};
pub use commands::{execute_search, run_normalize, run_search};
pub use fixture::{Fixture, FixtureBackend, FixtureError};
