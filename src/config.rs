//! Bot configuration loaded from YAML with environment overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the configuration file
pub const CONFIG_FILE: &str = "config/guildkeeper.yaml";
/// Overrides [`CONFIG_FILE`]
pub const CONFIG_ENV: &str = "GUILDKEEPER_CONFIG";
/// Overrides `database_path`
pub const DATABASE_ENV: &str = "GUILDKEEPER_DATABASE";
/// Overrides `reminder_interval_secs`
pub const REMINDER_INTERVAL_ENV: &str = "GUILDKEEPER_REMINDER_INTERVAL";

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Bot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// SQLite file holding all guild data
    pub database_path: PathBuf,
    /// Seconds between reminder sweeps
    pub reminder_interval_secs: u64,
    /// Directory for rolling JSON command logs
    pub log_dir: PathBuf,
    /// Reaction that counts towards the starboard
    pub starboard_emoji: String,
    /// Reactions needed before a message is posted to the starboard
    pub starboard_threshold: u64,
    /// Words removed by the `badwords` automod filter
    pub badwords: Vec<String>,
    /// Messages kept per channel so edit logs can show the previous text
    pub message_cache_size: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/guildkeeper.db"),
            reminder_interval_secs: 60,
            log_dir: PathBuf::from("logs"),
            starboard_emoji: "⭐".to_string(),
            starboard_threshold: 3,
            badwords: vec!["badword1".to_string(), "badword2".to_string()],
            message_cache_size: 200,
        }
    }
}

impl BotConfig {
    /// Load from `GUILDKEEPER_CONFIG` or [`CONFIG_FILE`], then apply environment overrides
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if an override is not a valid value.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).map_or_else(|_| PathBuf::from(CONFIG_FILE), PathBuf::from);
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load from a YAML file, or return the defaults if it does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse YAML; absent fields take their defaults
    ///
    /// # Errors
    /// Returns the YAML error if the content is malformed.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply overrides from a variable lookup (the environment in production)
    ///
    /// # Errors
    /// Returns an error if the reminder interval is not a positive integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_ENV) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(REMINDER_INTERVAL_ENV) {
            self.reminder_interval_secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidEnv {
                    name: REMINDER_INTERVAL_ENV,
                    value,
                })?;
        }
        Ok(())
    }

    /// Interval between reminder sweeps, never zero
    #[must_use]
    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs.max(1))
    }
}
