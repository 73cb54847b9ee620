//! Configuration module for nxresource
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/nxresource/nxresource.toml)
//! - User configuration (~/.nxresource.toml)
//! - Project configuration (./nxresource.toml)
//! - Environment variables
//!
//! An explicit path (`--config` or `NXRESOURCE_CONFIG`) replaces the search.
//! Files may be TOML, YAML or JSON, chosen by extension.

use crate::error::{Error, ErrorContext, Result};
use crate::modules::network::rm::OptionDefaults;
use crate::telemetry::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,

    /// Device settings used when no device is contacted
    pub device: DeviceConfig,
}

/// Default configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Output format: human, json or yaml
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: "human".to_string(),
        }
    }
}

/// Colors configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colors
    pub enabled: bool,

    /// Color of commands that add configuration
    pub add: String,

    /// Color of commands that remove configuration
    pub remove: String,

    /// Color of context-entry commands
    pub context: String,

    /// OK color
    pub ok: String,

    /// Changed color
    pub changed: String,

    /// Error color
    pub error: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            add: "green".to_string(),
            remove: "red".to_string(),
            context: "cyan".to_string(),
            ok: "green".to_string(),
            changed: "yellow".to_string(),
            error: "red".to_string(),
        }
    }
}

/// Device settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Platform defaults (`mode`, `enabled`) assumed for offline runs
    pub option_defaults: OptionDefaults,
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
        }

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.to_path_buf()];
        }

        let mut paths = vec![PathBuf::from("/etc/nxresource/nxresource.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".nxresource.toml"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("nxresource").join("config.toml"));
        }
        paths.push(PathBuf::from("nxresource.toml"));
        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; `other` wins where it differs
    /// from the defaults.
    fn merge(&self, other: Config) -> Config {
        let defaults = Config::default();
        let mut option_defaults = self.device.option_defaults.clone();
        option_defaults.extend(other.device.option_defaults);

        Config {
            defaults: if other.defaults != defaults.defaults {
                other.defaults
            } else {
                self.defaults.clone()
            },
            logging: if other.logging != defaults.logging {
                other.logging
            } else {
                self.logging.clone()
            },
            colors: if other.colors != defaults.colors {
                other.colors
            } else {
                self.colors.clone()
            },
            device: DeviceConfig { option_defaults },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // NXRESOURCE_LOG_LEVEL
        if let Ok(level) = std::env::var("NXRESOURCE_LOG_LEVEL") {
            if let Ok(level) = level.parse() {
                self.logging.level = level;
            }
        }

        // NXRESOURCE_LOG_FORMAT
        if let Ok(format) = std::env::var("NXRESOURCE_LOG_FORMAT") {
            if let Ok(format) = format.parse() {
                self.logging.format = format;
            }
        }

        // NXRESOURCE_OUTPUT
        if let Ok(output) = std::env::var("NXRESOURCE_OUTPUT") {
            self.defaults.output = output;
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() || std::env::var("NXRESOURCE_NO_COLOR").is_ok() {
            self.colors.enabled = false;
            self.logging.ansi_colors = false;
        }
    }

    /// Load from a specific file only, without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}
