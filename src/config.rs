//! Flowdeck Configuration Module
//!
//! Config is stored in `~/.config/flowdeck/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`GITHUB_TOKEN`, then `GH_TOKEN`)
//! 3. Config file
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FlowdeckError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashConfig {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

/// API endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubConfig {
    /// Personal access token (needs `repo` and `workflow` scopes)
    pub token: Option<String>,

    /// REST root, e.g. `https://ghe.example.com/api/v3` for Enterprise
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
        }
    }
}

impl GitHubConfig {
    /// Parsed and validated `api_url`
    pub fn api_base(&self) -> Result<Url> {
        let url = Url::parse(&self.api_url).map_err(|e| FlowdeckError::ConfigError {
            reason: format!("Invalid api_url '{}': {}", self.api_url, e),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FlowdeckError::ConfigError {
                reason: format!("api_url must be http(s), got scheme '{}'", other),
            }),
        }
    }
}

/// Background synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Deadline for one list-shaped fetch, fan-out included
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Concurrent per-item lookups during a fan-out
    #[serde(default = "default_fan_out_limit")]
    pub fan_out_limit: usize,

    #[serde(default)]
    pub live_on_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            fan_out_limit: default_fan_out_limit(),
            live_on_start: false,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn fan_out_limit(&self) -> usize {
        self.fan_out_limit.max(1)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_poll_interval() -> u64 {
    15
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_fan_out_limit() -> usize {
    8
}

impl DashConfig {
    /// Returns `~/.config/flowdeck/` on Unix, `%APPDATA%/flowdeck/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowdeck")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Directory for the log file
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowdeck")
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Missing file means defaults; a malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| FlowdeckError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| FlowdeckError::ConfigError {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;
        config.github.api_base()?;
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| FlowdeckError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| FlowdeckError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        fs::write(path, content).map_err(|e| FlowdeckError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })
    }

    /// Merge token from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// `GITHUB_TOKEN` wins over `GH_TOKEN`; empty values are ignored
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let token = ["GITHUB_TOKEN", "GH_TOKEN"]
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.is_empty());
        if let Some(token) = token {
            self.github.token = Some(token);
        }
        self
    }

    pub fn has_token(&self) -> bool {
        self.github.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Mask a token for display, e.g. "ghp_***"
pub fn mask_token(token: &str, visible_chars: usize) -> String {
    if token.is_empty() {
        return String::new();
    }
    let visible: String = token.chars().take(visible_chars).collect();
    format!("{}***", visible)
}
