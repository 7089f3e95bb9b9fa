//! Runtime configuration for embedding the lending core.
//!
//! # Responsibility
//! - Normalize log level and directory inputs.
//! - Build a `LendingConfig` from explicit values or `LENDTRACK_*` env vars.
//!
//! # Invariants
//! - `log_dir`, when set, is absolute.
//! - `log_level` is one of `trace|debug|info|warn|error`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Env var naming the SQLite database file.
pub const ENV_DB_PATH: &str = "LENDTRACK_DB_PATH";
/// Env var naming the log level.
pub const ENV_LOG_LEVEL: &str = "LENDTRACK_LOG_LEVEL";
/// Env var naming the absolute log directory.
pub const ENV_LOG_DIR: &str = "LENDTRACK_LOG_DIR";

/// Database file used when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "lendtrack.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLevel(String),
    EmptyPath(&'static str),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyPath(name) => write!(f, "{name} cannot be empty"),
            Self::RelativeLogDir(value) => {
                write!(f, "log_dir must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings needed to open storage and start logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl LendingConfig {
    /// Reads `LENDTRACK_DB_PATH`, `LENDTRACK_LOG_LEVEL` and `LENDTRACK_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(raw.trim());
        }
        if let Some(raw) = value(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&raw)?;
        }
        if let Some(raw) = value(ENV_LOG_DIR) {
            config.log_dir = Some(normalize_log_dir(&raw)?);
        }
        Ok(config)
    }
}

/// Returns the default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Maps user input to a canonical level name.
pub fn normalize_level(level: &str) -> Result<&'static str, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ConfigError::UnsupportedLevel(other.to_string())),
    }
}

/// Trims `log_dir` and requires an absolute path.
pub fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyPath("log_dir"));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(ConfigError::RelativeLogDir(trimmed.to_string()));
    }
    Ok(path.to_path_buf())
}
