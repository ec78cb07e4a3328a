//! Process configuration loaded from environment variables.
//!
//! SFMC credentials, endpoints and mappings are not here; they live in the
//! settings store so they can change without a restart.

use crate::services::sfmc::DEFAULT_TIMEOUT_SECS;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Bearer secret required on every API route
    pub api_token: String,
    /// Server port
    pub port: u16,
    /// JSON file backing the settings store
    pub settings_path: PathBuf,
    /// JSON file backing the record store
    pub records_path: PathBuf,
    /// Timeout for each SFMC request
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<redacted>")
            .field("port", &self.port)
            .field("settings_path", &self.settings_path)
            .field("records_path", &self.records_path)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_token: "test_api_token".to_string(),
            port: 8080,
            settings_path: PathBuf::from("sfmc_settings.json"),
            records_path: PathBuf::from("sfmc_records.json"),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            api_token: env::var("API_TOKEN")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("API_TOKEN"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            settings_path: env::var("SFMC_SETTINGS_PATH")
                .unwrap_or_else(|_| "sfmc_settings.json".to_string())
                .into(),
            records_path: env::var("SFMC_RECORDS_PATH")
                .unwrap_or_else(|_| "sfmc_records.json".to_string())
                .into(),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
