//! Configuration management for the Apollo settings server.
//!
//! Handles loading and validation of server configuration from TOML files
//! and command-line overrides. Module option values live in a separate
//! file managed by the registry's load/save path, not here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

fn default_options_file() -> String {
    "options.toml".to_string()
}

fn default_save_on_shutdown() -> bool {
    true
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Module options settings
    pub options: OptionsSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Where module option values are persisted and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsSettings {
    /// Path to the module options file
    #[serde(default = "default_options_file")]
    pub file: String,
    /// Write current option values back to the file on shutdown
    #[serde(default = "default_save_on_shutdown")]
    pub save_on_shutdown: bool,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            options: OptionsSettings {
                file: default_options_file(),
                save_on_shutdown: true,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file. If the file doesn't exist,
    /// creates a default configuration file at the specified path and
    /// returns the defaults.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.options.file.is_empty() {
            return Err("Options file path cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
