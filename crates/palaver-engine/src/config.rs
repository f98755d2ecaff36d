//! Configuration types for the palaver engine.
//!
//! This module defines the client configuration schema: the relay proxy
//! endpoint, the direct completion API and its sampling parameters, the
//! timeout budgets, and the conversation seed texts.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Relay proxy endpoint. Empty or absent forces direct-only mode.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Direct completion API endpoint for the fallback path.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Fallback credential, when supplied inline. Otherwise the credential
    /// probe is consulted.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for the direct path.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output size bound for the direct path.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for the direct path.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Timeout budget in seconds for the proxy path.
    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout_seconds: u64,

    /// Timeout budget in seconds for the direct path.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_seconds: u64,

    /// System persona text seeding every conversation.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Canned assistant greeting seeding every conversation.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f64 {
    0.2
}

fn default_proxy_timeout() -> u64 {
    8
}

fn default_api_timeout() -> u64 {
    12
}

fn default_persona() -> String {
    "You are a friendly, concise assistant. Answer questions helpfully and \
     keep replies short."
        .into()
}

fn default_greeting() -> String {
    "Hi! How can I help you today?".into()
}

impl ClientConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// The proxy endpoint, treating an empty string as unconfigured.
    pub fn proxy_endpoint(&self) -> Option<&str> {
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// The inline credential, treating an empty string as unconfigured.
    pub fn inline_credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            proxy_timeout_seconds: default_proxy_timeout(),
            api_timeout_seconds: default_api_timeout(),
            persona: default_persona(),
            greeting: default_greeting(),
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_tokens, 500);
        assert!((config.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.proxy_timeout_seconds, 8);
        assert_eq!(config.api_timeout_seconds, 12);
        assert!(config.proxy_endpoint().is_none());
        assert!(config.inline_credential().is_none());
    }

    #[test]
    fn test_empty_strings_treated_as_unconfigured() {
        let config = ClientConfig {
            proxy_url: Some("  ".into()),
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(config.proxy_endpoint().is_none());
        assert!(config.inline_credential().is_none());

        let config = ClientConfig {
            proxy_url: Some("https://relay.example/chat".into()),
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        assert_eq!(config.proxy_endpoint(), Some("https://relay.example/chat"));
        assert_eq!(config.inline_credential(), Some("sk-test"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"proxy_url": "https://relay.example/chat"}"#).unwrap();
        assert_eq!(config.proxy_endpoint(), Some("https://relay.example/chat"));
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 500);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ClientConfig::default();
        config.proxy_url = Some("https://relay.example/chat".into());
        config.model = "gpt-4o".into();

        config.save(&path).unwrap();
        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded.proxy_url, config.proxy_url);
        assert_eq!(loaded.model, "gpt-4o");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
