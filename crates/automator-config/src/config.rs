//! Configuration management for the client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default backend API root. Auth endpoints hang directly off it, resource
/// endpoints off its `/v1` child.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Default origin the OAuth redirect URI is built from.
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_API_BASE_URL: &str = "AUTOMATOR67_API_BASE_URL";
pub const ENV_GITHUB_CLIENT_ID: &str = "AUTOMATOR67_GITHUB_CLIENT_ID";
pub const ENV_APP_ORIGIN: &str = "AUTOMATOR67_APP_ORIGIN";
pub const ENV_LOG_LEVEL: &str = "AUTOMATOR67_LOG_LEVEL";

/// Main client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend API root URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// GitHub OAuth application client id.
    #[serde(default)]
    pub github_client_id: Option<String>,
    /// Origin used for the OAuth redirect URI.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_app_origin() -> String {
    DEFAULT_APP_ORIGIN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            github_client_id: None,
            app_origin: default_app_origin(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file (if any), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(client_id) = get(ENV_GITHUB_CLIENT_ID) {
            self.github_client_id = Some(client_id);
        }
        if let Some(origin) = get(ENV_APP_ORIGIN) {
            self.app_origin = origin;
        }
    }

    /// Backend API root as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// App origin as a parsed URL.
    pub fn app_origin(&self) -> CoreResult<Url> {
        Url::parse(&self.app_origin).map_err(CoreError::from)
    }

    /// The GitHub client id, or a configuration error when unset.
    pub fn require_github_client_id(&self) -> CoreResult<&str> {
        self.github_client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::Config("GitHub OAuth client ID not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.app_origin, DEFAULT_APP_ORIGIN);
        assert!(config.github_client_id.is_none());
    }

    #[test]
    fn test_config_load_from_file_partial() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "github_client_id": "Iv1.abc" }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.github_client_id.as_deref(), Some("Iv1.abc"));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            api_base_url: "https://api.automator67.dev/api".to_string(),
            ..Config::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert!(config.api_base_url().is_ok());
    }

    #[test]
    fn test_overrides_apply_and_skip_empty() {
        let env: HashMap<&str, &str> = [
            (ENV_API_BASE_URL, "https://example.test/api"),
            (ENV_GITHUB_CLIENT_ID, "client-123"),
            (ENV_LOG_LEVEL, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://example.test/api");
        assert_eq!(config.github_client_id.as_deref(), Some("client-123"));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.app_origin, DEFAULT_APP_ORIGIN);
    }

    #[test]
    fn test_require_github_client_id() {
        let mut config = Config::default();
        let err = config.require_github_client_id().unwrap_err();
        assert!(err.to_string().contains("GitHub OAuth client ID not configured"));

        config.github_client_id = Some("abc".to_string());
        assert_eq!(config.require_github_client_id().unwrap(), "abc");
    }

    #[test]
    fn test_config_invalid_url() {
        let config = Config {
            api_base_url: "not a valid url".to_string(),
            ..Config::default()
        };
        assert!(config.api_base_url().is_err());
    }
}
