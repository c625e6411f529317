//! Application configuration management.
//!
//! Two layers live here:
//! - `Config`: persisted user settings at `~/.config/gigdesk/config.json`
//!   (API base URL, timeout, last used email).
//! - `ApiConfig`: what the transport client is built from, resolved as
//!   built-in defaults < `Config` < environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/storage directory paths
const APP_NAME: &str = "gigdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Request timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Overrides the API base URL
pub const BASE_URL_ENV: &str = "GIGDESK_API_BASE_URL";

/// Overrides the request timeout, in milliseconds
pub const TIMEOUT_ENV: &str = "GIGDESK_API_TIMEOUT_MS";

/// Deployment mode; `development` pins the base URL to the local default
pub const ENV_MODE_ENV: &str = "GIGDESK_ENV";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for file-backed token storage
    pub fn storage_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

/// Settings the transport client is constructed from.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub default_headers: HeaderMap,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            default_headers,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Resolve from persisted settings and the process environment
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut api = Self::default();

        if let Some(ref url) = config.base_url {
            api.base_url = url.clone();
        }
        if let Some(ms) = config.timeout_ms {
            api.timeout = Duration::from_millis(ms);
        }

        if let Some(url) = env(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            api.base_url = url;
        }
        if let Some(raw) = env(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => api.timeout = Duration::from_millis(ms),
                _ => warn!(value = %raw, "Ignoring invalid {}", TIMEOUT_ENV),
            }
        }

        let development = env(ENV_MODE_ENV)
            .map(|mode| mode.eq_ignore_ascii_case("development"))
            .unwrap_or(false);
        if development {
            api.base_url = DEFAULT_BASE_URL.to_string();
        }

        api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let api = ApiConfig::resolve_with(&Config::default(), env_of(&[]));
        assert_eq!(api.base_url, DEFAULT_BASE_URL);
        assert_eq!(api.timeout, Duration::from_secs(30));
        assert_eq!(api.default_headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(api.default_headers[header::ACCEPT], "application/json");
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let config = Config {
            base_url: Some("https://staging.example.com/api".into()),
            timeout_ms: Some(5_000),
            last_email: None,
        };
        let api = ApiConfig::resolve_with(&config, env_of(&[]));
        assert_eq!(api.base_url, "https://staging.example.com/api");
        assert_eq!(api.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_environment_overrides_config_file() {
        let config = Config {
            base_url: Some("https://staging.example.com/api".into()),
            timeout_ms: Some(5_000),
            last_email: None,
        };
        let api = ApiConfig::resolve_with(
            &config,
            env_of(&[(BASE_URL_ENV, "https://api.example.com"), (TIMEOUT_ENV, "1500")]),
        );
        assert_eq!(api.base_url, "https://api.example.com");
        assert_eq!(api.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let api = ApiConfig::resolve_with(&Config::default(), env_of(&[(TIMEOUT_ENV, "soon")]));
        assert_eq!(api.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));

        let api = ApiConfig::resolve_with(&Config::default(), env_of(&[(TIMEOUT_ENV, "0")]));
        assert_eq!(api.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_development_mode_pins_local_url() {
        let api = ApiConfig::resolve_with(
            &Config::default(),
            env_of(&[(BASE_URL_ENV, "https://api.example.com"), (ENV_MODE_ENV, "development")]),
        );
        assert_eq!(api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_storage_dir_is_app_scoped() {
        // No cache dir on some CI sandboxes
        if let Ok(dir) = Config::storage_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            base_url: None,
            timeout_ms: Some(10_000),
            last_email: Some("user@x.com".into()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: Config = serde_json::from_str(r#"{"last_email":"a@b.co"}"#).unwrap();
        assert_eq!(partial.last_email.as_deref(), Some("a@b.co"));
        assert!(partial.base_url.is_none());
    }
}
