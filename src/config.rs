//! Configuration Management
//!
//! Settings come from a YAML file, then `UPCLOUD_*` environment variables,
//! then command line flags, each layer overriding the previous one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{Credentials, DEFAULT_API_URL};
use crate::executor::DEFAULT_MAX_ACTIONS_BEFORE_CONFIRM;

pub const ENV_USERNAME: &str = "UPCLOUD_USERNAME";
pub const ENV_PASSWORD: &str = "UPCLOUD_PASSWORD";
pub const ENV_API_URL: &str = "UPCLOUD_API_URL";

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_url: String,
    /// How long `--wait` waits for a state, in seconds
    pub client_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_actions_before_confirm: usize,
    /// Concurrent actions for low-risk commands
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            api_url: DEFAULT_API_URL.to_string(),
            client_timeout_secs: 120,
            poll_interval_ms: 2000,
            max_actions_before_confirm: DEFAULT_MAX_ACTIONS_BEFORE_CONFIRM,
            workers: 10,
        }
    }
}

impl Config {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("upctl").join("upctl.yaml"))
    }

    /// Load from `path` (or the default path). A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::debug!("No config file at {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("unable to parse config from file '{}'", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment values provided by `lookup`; empty values are ignored
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(username) = get(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(api_url) = get(ENV_API_URL) {
            self.api_url = api_url;
        }
    }

    /// Username and password, or a message naming what is missing
    pub fn credentials(&self) -> Result<Credentials> {
        let Some(username) = self.username.clone().filter(|u| !u.is_empty()) else {
            bail!(missing("User name", "username", ENV_USERNAME));
        };
        let Some(password) = self.password.clone().filter(|p| !p.is_empty()) else {
            bail!(missing("Password", "password", ENV_PASSWORD));
        };
        Ok(Credentials { username, password })
    }

    /// API base URL, always ending in `/` so relative paths join below it
    pub fn api_base(&self) -> Result<Url> {
        let mut raw = self.api_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("invalid api_url '{}'", self.api_url))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn missing(field: &str, key: &str, env: &str) -> String {
    format!(
        "{field} not defined. Either define it as '{key}' in the config file, or as {env} env variable."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.upcloud.com/1.3/");
        assert_eq!(config.max_actions_before_confirm, 10);
        assert_eq!(config.wait_timeout(), Duration::from_secs(120));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("username: alice\nworkers: 4\n").unwrap();
        assert_eq!(config.username.as_deref(), Some("alice"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.client_timeout_secs, 120);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_yaml("username: alice\npassword: file-secret\n").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_PASSWORD, "env-secret"),
            (ENV_USERNAME, ""),
            (ENV_API_URL, "http://localhost:8080/1.3"),
        ]);
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.username.as_deref(), Some("alice"));
        assert_eq!(config.password.as_deref(), Some("env-secret"));
        assert_eq!(
            config.api_base().unwrap().as_str(),
            "http://localhost:8080/1.3/"
        );
    }

    #[test]
    fn test_missing_credentials_message() {
        let err = Config::default().credentials().unwrap_err();
        assert_eq!(
            err.to_string(),
            "User name not defined. Either define it as 'username' in the config file, or as UPCLOUD_USERNAME env variable."
        );

        let config = Config {
            username: Some("alice".to_string()),
            ..Config::default()
        };
        assert!(config
            .credentials()
            .unwrap_err()
            .to_string()
            .starts_with("Password not defined"));
    }

    #[test]
    fn test_invalid_api_url() {
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.api_base().is_err());
    }
}
