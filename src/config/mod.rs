//! Server configuration, loaded from environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deepgram API key, used for both recognition and synthesis
    pub deepgram_api_key: String,
    /// Anthropic API key for the debate engine
    pub anthropic_api_key: String,
    /// Path of the player profile JSON file
    pub profile_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT".to_string(),
                value: raw,
            })?,
            None => 8000,
        };

        let deepgram_api_key = lookup("DEEPGRAM_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing("DEEPGRAM_API_KEY".to_string()))?;
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing("ANTHROPIC_API_KEY".to_string()))?;

        let profile_path = lookup("PROFILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("player_profile.json"));

        Ok(Self {
            host,
            port,
            deepgram_api_key,
            anthropic_api_key,
            profile_path,
        })
    }

    /// Socket address string for the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_applied() {
        let vars = env(&[
            ("DEEPGRAM_API_KEY", "dg_key"),
            ("ANTHROPIC_API_KEY", "an_key"),
        ]);
        let config = ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.address(), "0.0.0.0:8000");
        assert_eq!(config.profile_path, PathBuf::from("player_profile.json"));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let vars = env(&[("DEEPGRAM_API_KEY", "dg_key")]);
        let result = ServerConfig::from_lookup(|key| vars.get(key).cloned());
        assert!(matches!(result, Err(ConfigError::Missing(key)) if key == "ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_empty_api_key_treated_as_missing() {
        let vars = env(&[
            ("DEEPGRAM_API_KEY", ""),
            ("ANTHROPIC_API_KEY", "an_key"),
        ]);
        let result = ServerConfig::from_lookup(|key| vars.get(key).cloned());
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let vars = env(&[
            ("DEEPGRAM_API_KEY", "dg_key"),
            ("ANTHROPIC_API_KEY", "an_key"),
            ("PORT", "not-a-port"),
        ]);
        let result = ServerConfig::from_lookup(|key| vars.get(key).cloned());
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars = env(&[
            ("DEEPGRAM_API_KEY", "dg_key"),
            ("ANTHROPIC_API_KEY", "an_key"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9001"),
            ("PROFILE_PATH", "/tmp/profile.json"),
        ]);
        let config = ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.address(), "127.0.0.1:9001");
        assert_eq!(config.profile_path, PathBuf::from("/tmp/profile.json"));
    }
}
