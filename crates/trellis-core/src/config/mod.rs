//! Configuration management for Trellis.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `trellis.toml` file
//! 3. User config `~/.config/trellis/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery provider configuration.
    pub discovery: DiscoveryConfig,

    /// Run provider configuration.
    pub run: RunConfig,

    /// Tree building configuration.
    pub tree: TreeConfig,

    /// User notification configuration.
    pub notifications: NotificationConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./trellis.toml` (project local)
    /// 2. `~/.config/trellis/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("trellis").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TRELLIS_MANIFEST") {
            self.discovery.manifest_file = path;
        }
        if let Ok(path) = std::env::var("TRELLIS_RESULTS") {
            self.run.results_file = path;
        }
        if let Ok(separator) = std::env::var("TRELLIS_PACKAGE_SEPARATOR") {
            self.tree.package_separator = separator;
        }
        if let Ok(filter) = std::env::var("TRELLIS_LOG") {
            self.logging.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tree.package_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "tree.package_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Renders this configuration as TOML.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        Config::default().to_toml_string()
    }
}

/// Discovery provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// JSON manifest of discovered files.
    pub manifest_file: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.manifest_file)
    }
}

/// Run provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// JSON file of recorded results keyed by `nameToRun`.
    pub results_file: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            results_file: DEFAULT_RESULTS_FILE.to_string(),
        }
    }
}

impl RunConfig {
    pub fn results_path(&self) -> PathBuf {
        PathBuf::from(&self.results_file)
    }
}

/// Tree building configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Replaces path separators in derived package names.
    pub package_separator: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            package_separator: DEFAULT_PACKAGE_SEPARATOR.to_string(),
        }
    }
}

/// User notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Label of the follow-up action that opens the output.
    pub view_output_label: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            view_output_label: DEFAULT_VIEW_OUTPUT_LABEL.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
