//! Configuration loading for fedsearch.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/fedsearch/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TypesError;

/// Tuning for the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Page size used when a request asks for 0 (0 = return everything)
    #[serde(default)]
    pub default_page_size: u32,

    /// Maximum number of spaces searched at the same time (0 = unbounded)
    #[serde(default = "default_max_concurrent_spaces")]
    pub max_concurrent_spaces: usize,

    /// Field that free-text terms are matched against
    #[serde(default = "default_name_field")]
    pub name_field: String,
}

fn default_max_concurrent_spaces() -> usize {
    8
}

fn default_name_field() -> String {
    "Name".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: 0,
            max_concurrent_spaces: default_max_concurrent_spaces(),
            name_field: default_name_field(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        let mut chars = self.name_field.chars();
        match chars.next() {
            Some(c) if c.is_ascii_uppercase() => {}
            _ => {
                return Err(format!(
                    "name_field must start with an upper-case letter, got '{}'",
                    self.name_field
                ))
            }
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "name_field must be alphanumeric, got '{}'",
                self.name_field
            ));
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// JSON fixture describing spaces and index contents (CLI only)
    #[serde(default)]
    pub fixture_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            engine: EngineConfig::default(),
            fixture_path: None,
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/fedsearch/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (FEDSEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", "fedsearch")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("engine.default_page_size", 0_i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default(
                "engine.max_concurrent_spaces",
                default_max_concurrent_spaces() as i64,
            )
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("engine.name_field", default_name_field())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: FEDSEARCH_LOG_LEVEL, FEDSEARCH_ENGINE__MAX_CONCURRENT_SPACES, ...
        builder = builder.add_source(
            Environment::with_prefix("FEDSEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        settings.engine.validate().map_err(TypesError::Config)?;

        Ok(settings)
    }
}
