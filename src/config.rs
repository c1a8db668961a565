//! Configuration management for Healthchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{HealthchatError, Result};
use crate::providers::SUPPORTED_PROVIDERS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Healthchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Chat history storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat behavior configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Provider configuration
///
/// Specifies which model client to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("gemini" or "fake")
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model to use for Gemini
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Base URL of the generative language API
    ///
    /// Tests point this at a local mock server.
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// Timeout for a whole streamed request (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// Chat history storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the history database; the platform data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database path, falling back to the platform default
    ///
    /// # Errors
    ///
    /// Returns error if no path is configured and the platform data
    /// directory cannot be determined
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => crate::storage::default_history_path(),
        }
    }
}

/// What to do when a model reply finishes without producing any text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResponsePolicy {
    /// Leave the conversation as is; no model message is added
    #[default]
    Ignore,
    /// Add the fallback apology message
    Placeholder,
}

impl std::str::FromStr for EmptyResponsePolicy {
    type Err = HealthchatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(HealthchatError::Config(format!(
                "Invalid empty response policy: {}. Must be one of: ignore, placeholder",
                other
            ))),
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Handling of replies that stream zero fragments
    #[serde(default)]
    pub empty_response: EmptyResponsePolicy,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HealthchatError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::config::Config;
    ///
    /// let config = Config::from_yaml("provider:\n  type: fake\n").unwrap();
    /// assert_eq!(config.provider.provider_type, "fake");
    /// assert_eq!(config.provider.gemini.model, "gemini-2.5-flash");
    /// ```
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| HealthchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("HEALTHCHAT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("HEALTHCHAT_GEMINI_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(api_base) = std::env::var("HEALTHCHAT_GEMINI_API_BASE") {
            self.provider.gemini.api_base = api_base;
        }

        if let Ok(timeout) = std::env::var("HEALTHCHAT_GEMINI_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.gemini.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid HEALTHCHAT_GEMINI_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(db_path) = std::env::var("HEALTHCHAT_HISTORY_DB") {
            tracing::debug!(db_path = %db_path, "Env override: HEALTHCHAT_HISTORY_DB");
            self.storage.path = Some(PathBuf::from(db_path));
        }

        if let Ok(policy) = std::env::var("HEALTHCHAT_EMPTY_RESPONSE") {
            match policy.parse() {
                Ok(value) => self.chat.empty_response = value,
                Err(_) => tracing::warn!("Invalid HEALTHCHAT_EMPTY_RESPONSE: {}", policy),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(db_path) = &cli.storage_path {
            tracing::info!("Using storage DB override from CLI: {}", db_path);
            self.storage.path = Some(PathBuf::from(db_path));
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(HealthchatError::Config("Provider type cannot be empty".to_string()).into());
        }

        if !SUPPORTED_PROVIDERS.contains(&self.provider.provider_type.as_str()) {
            return Err(HealthchatError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                SUPPORTED_PROVIDERS.join(", ")
            ))
            .into());
        }

        let gemini = &self.provider.gemini;
        if gemini.model.trim().is_empty() {
            return Err(
                HealthchatError::Config("gemini.model cannot be empty".to_string()).into(),
            );
        }

        if !(gemini.api_base.starts_with("http://") || gemini.api_base.starts_with("https://")) {
            return Err(HealthchatError::Config(format!(
                "gemini.api_base must be an http(s) URL: {}",
                gemini.api_base
            ))
            .into());
        }

        if gemini.timeout_seconds == 0 {
            return Err(HealthchatError::Config(
                "gemini.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if let Some(path) = &self.storage.path {
            if path.as_os_str().is_empty() {
                return Err(
                    HealthchatError::Config("storage.path cannot be empty".to_string()).into(),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_error_contains, temp_dir, test_config_yaml};
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "gemini");
        assert_eq!(config.provider.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.chat.empty_response, EmptyResponsePolicy::Ignore);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_provider() {
        let mut config = Config::default();
        config.provider.provider_type = String::new();
        assert_error_contains(config.validate(), "Provider type cannot be empty");
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.provider.provider_type = "copilot".to_string();
        assert_error_contains(config.validate(), "Must be one of: gemini, fake");
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.provider.gemini.model = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_api_base() {
        let mut config = Config::default();
        config.provider.gemini.api_base = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.provider.gemini.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: fake
  gemini:
    model: gemini-2.0-pro
    timeout_seconds: 30
storage:
  path: /tmp/healthchat/history.sled
chat:
  empty_response: placeholder
"#;
        let config = Config::from_yaml(yaml).expect("parse");
        assert_eq!(config.provider.provider_type, "fake");
        assert_eq!(config.provider.gemini.model, "gemini-2.0-pro");
        assert_eq!(config.provider.gemini.timeout_seconds, 30);
        assert_eq!(
            config.provider.gemini.api_base,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(
            config.storage.path,
            Some(PathBuf::from("/tmp/healthchat/history.sled"))
        );
        assert_eq!(config.chat.empty_response, EmptyResponsePolicy::Placeholder);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_reads_yaml_file() {
        let dir = temp_dir();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, test_config_yaml()).unwrap();

        let config =
            Config::load(path.to_str().unwrap(), &crate::cli::Cli::default()).expect("load");
        assert_eq!(config.provider.provider_type, "fake");
        assert_eq!(config.chat.empty_response, EmptyResponsePolicy::Placeholder);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").expect("parse");
        assert_eq!(config.provider.provider_type, "gemini");
    }

    #[test]
    fn test_config_from_invalid_yaml() {
        let err = Config::from_yaml("provider: [").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_empty_response_policy_from_str() {
        assert_eq!(
            "Placeholder".parse::<EmptyResponsePolicy>().unwrap(),
            EmptyResponsePolicy::Placeholder
        );
        assert_eq!(
            "ignore".parse::<EmptyResponsePolicy>().unwrap(),
            EmptyResponsePolicy::Ignore
        );
        assert!("sometimes".parse::<EmptyResponsePolicy>().is_err());
    }

    #[test]
    fn test_storage_resolve_prefers_configured_path() {
        let storage = StorageConfig {
            path: Some(PathBuf::from("/data/history.sled")),
        };
        assert_eq!(
            storage.resolve_path().unwrap(),
            PathBuf::from("/data/history.sled")
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_applied() {
        std::env::set_var("HEALTHCHAT_PROVIDER", "fake");
        std::env::set_var("HEALTHCHAT_GEMINI_MODEL", "gemini-test");
        std::env::set_var("HEALTHCHAT_HISTORY_DB", "/tmp/env-history.sled");
        std::env::set_var("HEALTHCHAT_EMPTY_RESPONSE", "placeholder");
        std::env::set_var("HEALTHCHAT_GEMINI_TIMEOUT_SECONDS", "not-a-number");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.provider.provider_type, "fake");
        assert_eq!(config.provider.gemini.model, "gemini-test");
        assert_eq!(
            config.storage.path,
            Some(PathBuf::from("/tmp/env-history.sled"))
        );
        assert_eq!(config.chat.empty_response, EmptyResponsePolicy::Placeholder);
        assert_eq!(config.provider.gemini.timeout_seconds, 120);

        for name in [
            "HEALTHCHAT_PROVIDER",
            "HEALTHCHAT_GEMINI_MODEL",
            "HEALTHCHAT_HISTORY_DB",
            "HEALTHCHAT_EMPTY_RESPONSE",
            "HEALTHCHAT_GEMINI_TIMEOUT_SECONDS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults_and_cli_storage_override() {
        let cli = crate::cli::Cli {
            storage_path: Some("/tmp/cli-history.sled".to_string()),
            ..crate::cli::Cli::default()
        };
        let config = Config::load("/nonexistent/healthchat.yaml", &cli).expect("load");
        assert_eq!(
            config.storage.path,
            Some(PathBuf::from("/tmp/cli-history.sled"))
        );
    }
}
