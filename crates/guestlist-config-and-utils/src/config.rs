//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default wait for the first guest snapshot, in milliseconds.
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 10_000;

/// Options used for events that configure none.
pub const DEFAULT_OPTIONS: &str = "name";

const LOG_LEVEL_ENV: &str = "GUESTLIST_LOG_LEVEL";
const SYNC_TIMEOUT_ENV: &str = "GUESTLIST_SYNC_TIMEOUT_MS";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Wait for the first snapshot before reporting a timeout. Zero waits forever.
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
    /// Column options for events created without any.
    #[serde(default = "default_options")]
    pub default_options: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_sync_timeout_ms() -> u64 {
    DEFAULT_SYNC_TIMEOUT_MS
}

fn default_options() -> String {
    DEFAULT_OPTIONS.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sync_timeout_ms: DEFAULT_SYNC_TIMEOUT_MS,
            default_options: default_options(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// The first-snapshot timeout, or `None` when disabled.
    pub fn sync_timeout(&self) -> Option<Duration> {
        (self.sync_timeout_ms > 0).then(|| Duration::from_millis(self.sync_timeout_ms))
    }

    fn validate(&self) -> CoreResult<()> {
        if self.default_options.trim().is_empty() {
            return Err(CoreError::Config(
                "default_options must name at least one column".to_string(),
            ));
        }
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Applies overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(log_level) = lookup(LOG_LEVEL_ENV).and_then(non_empty) {
            self.log_level = log_level;
        }
        if let Some(raw) = lookup(SYNC_TIMEOUT_ENV).and_then(non_empty) {
            match raw.parse::<u64>() {
                Ok(ms) => self.sync_timeout_ms = ms,
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "ignoring invalid {}", SYNC_TIMEOUT_ENV)
                }
            }
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
