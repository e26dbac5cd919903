//! Configuration loading, validation, and management for LibreAssistant.
//!
//! Loads configuration from `~/.libreassistant/config.toml` with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.libreassistant/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model service configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Orchestration loop configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Plugin configuration
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// Settings for the turn-taking model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the model service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP timeout for one model turn, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Settings for the iteration controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum completed plugin rounds per request (safety bound)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// How many times to re-prompt after unparseable model output
    #[serde(default = "default_parse_retry_limit")]
    pub parse_retry_limit: usize,

    /// Default timeout for one plugin execution, in seconds
    #[serde(default = "default_plugin_timeout")]
    pub plugin_timeout_secs: u64,

    /// Per-plugin timeout overrides (plugin id → seconds)
    #[serde(default)]
    pub plugin_timeouts: HashMap<String, u64>,

    /// Token budget for the assembled prompt context
    #[serde(default = "default_token_budget")]
    pub context_token_budget: usize,
}

fn default_max_iterations() -> usize {
    5
}
fn default_parse_retry_limit() -> usize {
    2
}
fn default_plugin_timeout() -> u64 {
    10
}
fn default_token_budget() -> usize {
    4096
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            parse_retry_limit: default_parse_retry_limit(),
            plugin_timeout_secs: default_plugin_timeout(),
            plugin_timeouts: HashMap::new(),
            context_token_budget: default_token_budget(),
        }
    }
}

impl OrchestratorConfig {
    /// The timeout to apply to one execution of the given plugin.
    pub fn plugin_timeout_for(&self, plugin_id: &str) -> Duration {
        let secs = self
            .plugin_timeouts
            .get(plugin_id)
            .copied()
            .unwrap_or(self.plugin_timeout_secs);
        Duration::from_secs(secs)
    }
}

/// Settings for built-in plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Sandbox root for the file-io plugin. Defaults to
    /// `~/.libreassistant/files` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_io_root: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path
    /// (`~/.libreassistant/config.toml`).
    ///
    /// Environment variable overrides (highest priority):
    /// - `LIBREASSISTANT_BASE_URL`
    /// - `LIBREASSISTANT_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(base_url) = std::env::var("LIBREASSISTANT_BASE_URL") {
            config.model.base_url = base_url;
        }
        if let Ok(model) = std::env::var("LIBREASSISTANT_MODEL") {
            config.model.model = model;
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
        dirs_home().join(".libreassistant")
    }

    /// The sandbox root for the file-io plugin.
    pub fn file_io_root(&self) -> PathBuf {
        self.plugins
            .file_io_root
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("files"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "orchestrator.max_iterations must be at least 1".into(),
            ));
        }

        if self.model.temperature < 0.0 || self.model.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.model must not be empty".into(),
            ));
        }

        if self.orchestrator.context_token_budget < 256 {
            return Err(ConfigError::ValidationError(
                "orchestrator.context_token_budget must be at least 256".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orchestrator.max_iterations, 5);
        assert_eq!(config.orchestrator.parse_retry_limit, 2);
        assert_eq!(config.model.base_url, "http://localhost:11434");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.orchestrator.max_iterations,
            config.orchestrator.max_iterations
        );
        assert_eq!(parsed.model.model, config.model.model);
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = AppConfig {
            orchestrator: OrchestratorConfig {
                max_iterations: 0,
                ..OrchestratorConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            model: ModelConfig {
                temperature: 5.0,
                ..ModelConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().orchestrator.max_iterations, 5);
    }

    #[test]
    fn per_plugin_timeout_overrides() {
        let toml_str = r#"
[orchestrator]
plugin_timeout_secs = 10

[orchestrator.plugin_timeouts]
web-search = 30
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.orchestrator.plugin_timeout_for("web-search"),
            Duration::from_secs(30)
        );
        assert_eq!(
            config.orchestrator.plugin_timeout_for("file-io"),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn load_from_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[model]
model = "mistral"
base_url = "http://localhost:9999"

[orchestrator]
max_iterations = 3
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model.model, "mistral");
        assert_eq!(config.orchestrator.max_iterations, 3);
        // Unset fields keep their defaults
        assert_eq!(config.orchestrator.parse_retry_limit, 2);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\ntemperature = 99.0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama3.2"));
        assert!(toml_str.contains("max_iterations"));
    }

    #[test]
    fn file_io_root_falls_back_to_config_dir() {
        let config = AppConfig::default();
        assert!(config.file_io_root().ends_with("files"));

        let config = AppConfig {
            plugins: PluginsConfig {
                file_io_root: Some("/srv/sandbox".into()),
            },
            ..AppConfig::default()
        };
        assert_eq!(config.file_io_root(), PathBuf::from("/srv/sandbox"));
    }
}
