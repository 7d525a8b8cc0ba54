//! Configuration management for the check-in client.
//!
//! Loads configuration from ${CHECKIN_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Literal API endpoint used when neither env nor config provide one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Environment variable that overrides the API endpoint.
pub const API_URL_ENV: &str = "CHECKIN_API_URL";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Check-in client configuration

# API endpoint (the CHECKIN_API_URL environment variable takes precedence)
# api_base_url = "http://localhost:8080/api"

# Request timeout in seconds (0 disables)
request_timeout_secs = 30
"#;

pub mod paths {
    //! Path resolution for configuration and credential files.
    //!
    //! CHECKIN_HOME resolution order:
    //! 1. CHECKIN_HOME environment variable (if set)
    //! 2. ~/.config/checkin (default)
    //! 3. ./.checkin when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the client home directory.
    pub fn checkin_home() -> PathBuf {
        if let Ok(home) = std::env::var("CHECKIN_HOME") {
            let trimmed = home.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".checkin"),
            |h| h.join(".config").join("checkin"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        checkin_home().join("config.toml")
    }

    /// Returns the path to the persisted credential file.
    pub fn credentials_path() -> PathBuf {
        checkin_home().join("credentials.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API endpoint; blank is treated as unset
    pub api_base_url: Option<String>,

    /// Timeout for each API request in seconds (0 disables)
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, DEFAULT_CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Returns the configured base URL if set and non-empty.
    pub fn effective_api_base_url(&self) -> Option<&str> {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the env or config value is not a valid URL.
    pub fn resolve_api_base_url(&self) -> Result<String> {
        let env_value = std::env::var(API_URL_ENV).ok();
        resolve_base_url(env_value.as_deref(), self.effective_api_base_url())
    }
}

/// Picks the first non-blank candidate, validates it, and trims any trailing
/// slash so paths can be appended with a single `/`.
fn resolve_base_url(env_url: Option<&str>, config_url: Option<&str>) -> Result<String> {
    let chosen = [env_url, config_url]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty());

    let Some(url) = chosen else {
        return Ok(DEFAULT_API_BASE_URL.to_string());
    };

    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(url.trim_end_matches('/').to_string())
}
