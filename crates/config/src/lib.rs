//! Configuration loading, validation, and management for Lorebase.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! and validates all settings at startup. Missing credentials and unknown
//! model names are fatal here, never silently defaulted at call sites.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use lorebase_core::tokenizer::max_prompt_size;

/// The root configuration structure.
///
/// Maps directly to `~/.lorebase/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Research loop settings
    #[serde(default)]
    pub research: ResearchConfig,

    /// Tool endpoint settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the chat-completions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name. Must have a registered prompt-size budget.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Maximum tool-use rounds per user turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// How many past (user, assistant) exchanges the context window considers
    #[serde(default = "default_lookback_turns")]
    pub lookback_turns: usize,
}

fn default_max_iterations() -> usize {
    5
}
fn default_lookback_turns() -> usize {
    10
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            lookback_turns: default_lookback_turns(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// API key for the web-search service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,

    /// Web-search endpoint
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Code-sandbox endpoint
    #[serde(default = "default_sandbox_url")]
    pub sandbox_url: String,
}

fn default_search_url() -> String {
    "https://google.serper.dev/search".into()
}
fn default_sandbox_url() -> String {
    "http://localhost:8080/run".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_api_key: None,
            search_url: default_search_url(),
            sandbox_url: default_sandbox_url(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("research", &self.research)
            .field("tools", &self.tools)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("search_api_key", &redact(&self.search_api_key))
            .field("search_url", &self.search_url)
            .field("sandbox_url", &self.sandbox_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.lorebase/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `LOREBASE_API_KEY` / `OPENAI_API_KEY` for the provider key
    /// - `LOREBASE_MODEL` for the model
    /// - `SERPER_API_KEY` for web search
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("LOREBASE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("LOREBASE_MODEL") {
            config.provider.model = model;
        }

        if config.tools.search_api_key.is_none() {
            config.tools.search_api_key = std::env::var("SERPER_API_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields defaults; validation still applies afterwards
    /// in `load()`, once env overrides have been folded in.
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

        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lorebase")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if max_prompt_size(&self.provider.model).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "model '{}' has no registered prompt-size budget",
                self.provider.model
            )));
        }

        if self.research.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_iterations must be at least 1".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if a provider API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            research: ResearchConfig::default(),
            tools: ToolsConfig::default(),
        }
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
        assert_eq!(config.provider.model, "gpt-4");
        assert_eq!(config.research.max_iterations, 5);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.model, config.provider.model);
        assert_eq!(parsed.research.lookback_turns, config.research.lookback_turns);
    }

    #[test]
    fn unknown_model_rejected() {
        let mut config = AppConfig::default();
        config.provider.model = "gpt-9000".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.research.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().provider.model, "gpt-4");
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-very-secret".into());
        config.tools.search_api_key = Some("serper-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[provider]
model = "gpt-3.5-turbo"

[research]
max_iterations = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.research.max_iterations, 3);
        assert_eq!(config.research.lookback_turns, 10);
        assert!(config.validate().is_ok());
    }
}
