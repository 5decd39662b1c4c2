//! Configuration Management
//!
//! [`ClientConfig`] describes how to reach the social REST API and is all the
//! library needs. [`Config`] is the persisted CLI configuration that resolves
//! into a `ClientConfig`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Default server root when nothing is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Environment variable overriding the configured server
pub const SERVER_ENV: &str = "SOCIAL_CLIENT_SERVER";

/// Environment variable overriding the configured username
pub const USER_ENV: &str = "SOCIAL_CLIENT_USER";

/// Connection settings for the social REST API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8080`
    pub server_url: String,
    /// Name of the REST web application
    pub rest_context: String,
    pub api_version: String,
    pub portal_container: String,
    pub user_agent: String,
    /// Transport timeout; none by default
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            rest_context: "rest".to_string(),
            api_version: "v1-alpha1".to_string(),
            portal_container: "portal".to_string(),
            user_agent: format!("social-client/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Path of the social API below the server root
    ///
    /// Authenticated resources live under the `private` prefix, e.g.
    /// `rest/private/api/social/v1-alpha1/portal/`.
    pub fn rest_path(&self, private: bool) -> String {
        format!(
            "{}/{}api/social/{}/{}/",
            self.rest_context.trim_matches('/'),
            if private { "private/" } else { "" },
            self.api_version,
            self.portal_container
        )
    }

    /// Absolute base URL of the social API
    pub fn base_url(&self, private: bool) -> std::result::Result<Url, url::ParseError> {
        let mut root = self.server_url.trim().to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        Url::parse(&root)?.join(&self.rest_path(private))
    }
}

/// Validate a server URL: must parse and use http or https
pub fn validate_server_url(server_url: &str) -> bool {
    Url::parse(server_url)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used server
    #[serde(default)]
    pub server_url: Option<String>,
    /// Last used username (passwords are never persisted)
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub rest_context: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub portal_container: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("social-client").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective server (environment > config > default)
    pub fn effective_server_url(&self) -> String {
        if let Ok(server) = std::env::var(SERVER_ENV) {
            if validate_server_url(&server) {
                return server;
            }
            tracing::warn!("Invalid server URL in {}", SERVER_ENV);
        }
        self.server_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    /// Get effective username (environment > config)
    pub fn effective_username(&self) -> Option<String> {
        std::env::var(USER_ENV)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.username.clone())
    }

    /// Resolve into a client configuration; `server_url` wins when given
    pub fn client_config(&self, server_url: Option<&str>) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            server_url: server_url
                .map(str::to_string)
                .unwrap_or_else(|| self.effective_server_url()),
            rest_context: self.rest_context.clone().unwrap_or(defaults.rest_context),
            api_version: self.api_version.clone().unwrap_or(defaults.api_version),
            portal_container: self
                .portal_container
                .clone()
                .unwrap_or(defaults.portal_container),
            user_agent: defaults.user_agent,
            timeout_secs: self.timeout_secs,
        }
    }

    /// Set server and save
    pub fn set_server_url(&mut self, server_url: &str) -> Result<()> {
        if !validate_server_url(server_url) {
            anyhow::bail!("Invalid server URL: {}", server_url);
        }
        self.server_url = Some(server_url.to_string());
        self.save()
    }

    /// Set username and save
    pub fn set_username(&mut self, username: &str) -> Result<()> {
        self.username = Some(username.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_path() {
        let config = ClientConfig::default();
        assert_eq!(config.rest_path(true), "rest/private/api/social/v1-alpha1/portal/");
        assert_eq!(config.rest_path(false), "rest/api/social/v1-alpha1/portal/");
    }

    #[test]
    fn test_base_url_keeps_server_path() {
        let config = ClientConfig::new("http://example.com/social");
        assert_eq!(
            config.base_url(true).unwrap().as_str(),
            "http://example.com/social/rest/private/api/social/v1-alpha1/portal/"
        );

        let config = ClientConfig::new("http://example.com:8080/");
        assert_eq!(
            config.base_url(false).unwrap().as_str(),
            "http://example.com:8080/rest/api/social/v1-alpha1/portal/"
        );
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        assert!(ClientConfig::new("not a url").base_url(true).is_err());
    }

    #[test]
    fn test_validate_server_url() {
        assert!(validate_server_url("http://localhost:8080"));
        assert!(validate_server_url("https://social.example.com"));
        assert!(!validate_server_url("ftp://example.com"));
        assert!(!validate_server_url("localhost"));
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: Config = serde_json::from_str(r#"{"server_url":"http://h:1"}"#).unwrap();
        assert_eq!(config.server_url.as_deref(), Some("http://h:1"));
        assert!(config.username.is_none());

        let client = config.client_config(Some("http://override:2"));
        assert_eq!(client.server_url, "http://override:2");
        assert_eq!(client.api_version, "v1-alpha1");
    }
}
