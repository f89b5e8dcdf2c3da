//! Configuration management for nexuschat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{NexusError, Result};
use crate::session::DEFAULT_TITLE_MAX_CHARS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for nexuschat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Credential lookup settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Chat behavior settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the CodeNexus backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    ///
    /// When unset the HTTP client's default applies (no explicit deadline).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
        }
    }
}

impl ApiConfig {
    /// Configured timeout as a [`Duration`]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token; takes precedence over the keyring
    #[serde(default)]
    pub token: Option<String>,

    /// Keyring account the token is stored under
    #[serde(default = "default_keyring_account")]
    pub keyring_account: String,
}

fn default_keyring_account() -> String {
    "default".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            keyring_account: default_keyring_account(),
        }
    }
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum characters kept in a session title before truncation
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_title_max_chars() -> usize {
    DEFAULT_TITLE_MAX_CHARS
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            title_max_chars: default_title_max_chars(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
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
            .map_err(|e| NexusError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| NexusError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("NEXUSCHAT_API_URL") {
            tracing::debug!(url = %url, "Env override: NEXUSCHAT_API_URL");
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("NEXUSCHAT_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.api.timeout_ms = Some(v),
                Err(_) => tracing::warn!("Invalid NEXUSCHAT_TIMEOUT_MS: {}", timeout),
            }
        }

        if let Ok(token) = std::env::var("NEXUSCHAT_TOKEN") {
            if !token.is_empty() {
                self.auth.token = Some(token);
            }
        }

        if let Ok(account) = std::env::var("NEXUSCHAT_KEYRING_ACCOUNT") {
            self.auth.keyring_account = account;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.api_url {
            self.api.base_url = url.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not an absolute http(s) URL, the
    /// timeout is zero, or the title length is zero
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            NexusError::Config(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(NexusError::Config(format!(
                "api.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.timeout_ms == Some(0) {
            return Err(
                NexusError::Config("api.timeout_ms must be greater than 0".to_string()).into(),
            );
        }

        if self.chat.title_max_chars == 0 {
            return Err(NexusError::Config(
                "chat.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.auth.keyring_account.trim().is_empty() {
            return Err(
                NexusError::Config("auth.keyring_account cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}
