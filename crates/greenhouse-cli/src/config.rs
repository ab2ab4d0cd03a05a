//! Configuration file management.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default backend URL when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl Config {
    /// Path to the config file (`<config_dir>/greenhouse/config.toml`).
    pub fn path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("greenhouse").join("config.toml")
    }

    /// Load the config file, or defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Resolve the backend URL: explicit flag/env beats the config
    /// file, which beats the default.
    pub fn resolve_api_url(&self, override_url: Option<&str>) -> String {
        override_url
            .map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_url_precedence() {
        let config = Config {
            api_url: Some("http://greenhouse.local:9000".to_string()),
        };
        assert_eq!(
            config.resolve_api_url(Some("http://cli-flag:1234")),
            "http://cli-flag:1234"
        );
        assert_eq!(
            config.resolve_api_url(None),
            "http://greenhouse.local:9000"
        );
        assert_eq!(Config::default().resolve_api_url(None), DEFAULT_API_URL);
    }

    #[test]
    fn test_config_parses_partial_file() {
        let config: Config = toml::from_str("api_url = \"http://example:8000\"").unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://example:8000"));

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty.api_url, None);
    }
}
