//! Configuration loading, validation, and flag parsing for Canary.
//!
//! Trace behaviour is driven by a small set of flags. They arrive either as a
//! step's configuration string (`PARENTCONTEXT=true;MAXITEMLENGTH=500`) or from
//! `~/.canary/config.toml`, with the `CANARY_OPTIONS` environment variable
//! applied on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Scalars longer than this are truncated unless configured otherwise.
pub const DEFAULT_MAX_ITEM_LENGTH: usize = 200;

/// Largest accepted truncation length.
pub const MAX_ITEM_LENGTH_LIMIT: usize = 1_000_000;

/// Environment variable holding a flag string applied over the config file.
pub const OPTIONS_ENV_VAR: &str = "CANARY_OPTIONS";

/// The recognized trace flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOptions {
    /// Walk the chain of parent contexts (`PARENTCONTEXT`)
    #[serde(default)]
    pub parent_context: bool,

    /// Append runtime type names to values (`ATTRIBUTETYPES`)
    #[serde(default)]
    pub attribute_types: bool,

    /// Translate structured queries to FetchXML (`CONVERTQUERIES`)
    #[serde(default)]
    pub convert_queries: bool,

    /// Render every entity of a collection (`EXPANDCOLLECTIONS`)
    #[serde(default)]
    pub expand_collections: bool,

    /// Include contexts in the internal stage 30 (`INCLUDESTAGE30`)
    #[serde(default)]
    pub include_stage30: bool,

    /// Truncate scalar text beyond this many chars; 0 disables (`MAXITEMLENGTH`)
    #[serde(default = "default_max_item_length")]
    pub max_item_length: usize,
}

fn default_max_item_length() -> usize {
    DEFAULT_MAX_ITEM_LENGTH
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            parent_context: false,
            attribute_types: false,
            convert_queries: false,
            expand_collections: false,
            include_stage30: false,
            max_item_length: default_max_item_length(),
        }
    }
}

impl TraceOptions {
    /// Parse a flag string, starting from the defaults.
    pub fn parse(flags: &str) -> Self {
        let mut options = Self::default();
        options.apply(flags);
        options
    }

    /// Apply a flag string on top of the current values.
    ///
    /// Names are case-insensitive; pairs may be separated by `;`, `,`, `&` or
    /// whitespace. Unknown names and unparsable values are logged and skipped,
    /// so a bad configuration string never stops a trace.
    pub fn apply(&mut self, flags: &str) {
        let pairs = flags
            .split(|c: char| c == ';' || c == ',' || c == '&' || c.is_whitespace())
            .filter(|p| !p.is_empty());

        for pair in pairs {
            let (name, value) = match pair.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => (pair.trim(), "true"),
            };

            let name = name.to_ascii_uppercase();
            if name == "MAXITEMLENGTH" {
                match value.parse::<usize>() {
                    Ok(len) if len <= MAX_ITEM_LENGTH_LIMIT => self.max_item_length = len,
                    _ => tracing::warn!(value, "Ignoring invalid MAXITEMLENGTH"),
                }
                continue;
            }

            let Some(flag) = self.flag_mut(&name) else {
                tracing::debug!(flag = %name, "Ignoring unknown trace flag");
                continue;
            };
            match parse_bool(value) {
                Some(b) => *flag = b,
                None => tracing::warn!(flag = %name, value, "Ignoring non-boolean flag value"),
            }
        }
    }

    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        match name {
            "PARENTCONTEXT" => Some(&mut self.parent_context),
            "ATTRIBUTETYPES" => Some(&mut self.attribute_types),
            "CONVERTQUERIES" => Some(&mut self.convert_queries),
            "EXPANDCOLLECTIONS" => Some(&mut self.expand_collections),
            "INCLUDESTAGE30" => Some(&mut self.include_stage30),
            _ => None,
        }
    }

    /// Render back to a canonical flag string.
    pub fn to_flag_string(&self) -> String {
        format!(
            "PARENTCONTEXT={};ATTRIBUTETYPES={};CONVERTQUERIES={};EXPANDCOLLECTIONS={};INCLUDESTAGE30={};MAXITEMLENGTH={}",
            self.parent_context,
            self.attribute_types,
            self.convert_queries,
            self.expand_collections,
            self.include_stage30,
            self.max_item_length
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_item_length > MAX_ITEM_LENGTH_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "trace.max_item_length must be at most {MAX_ITEM_LENGTH_LIMIT}"
            )));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Logging settings for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// The root configuration structure.
///
/// Maps directly to `~/.canary/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanaryConfig {
    #[serde(default)]
    pub trace: TraceOptions,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CanaryConfig {
    /// Load from the default location, then apply `CANARY_OPTIONS`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&path)?;

        if let Ok(flags) = std::env::var(OPTIONS_ENV_VAR) {
            tracing::debug!(flags = %flags, "Applying {OPTIONS_ENV_VAR}");
            config.trace.apply(&flags);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".canary")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.trace.validate()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
