//! Configuration types and loading
//!
//! Defaults are overridden by an optional config file, then by `USERDESK_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Remote users API
    pub api: ApiConfig,

    /// Credential storage
    pub auth: AuthConfig,

    /// Listing defaults
    pub listing: ListingConfig,

    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the admin API, e.g. `https://host/api/admin`
    pub base_url: String,
    /// Base URL the login endpoint lives under (often the same host)
    pub auth_base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JSON file holding the bearer token; in-memory only when unset
    pub credentials_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ListingConfig {
    pub default_page_size: u32,
    /// Country counted as "domestic" by the statistics
    pub home_country: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8000/api/admin".to_string(),
                auth_base_url: "http://localhost:8000/api/admin".to_string(),
                timeout_seconds: 30,
            },
            auth: AuthConfig {
                credentials_path: None,
            },
            listing: ListingConfig {
                default_page_size: crate::pagination::DEFAULT_PAGE_SIZE,
                home_country: "ایران".to_string(),
            },
            logging: LoggingConfig {
                filter: "info".to_string(),
                json: false,
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config file error: {0}")]
    FileError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::FileError(err.to_string())
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from an optional file, then apply environment overrides.
    ///
    /// The file format is picked from its extension (`.toml`, `.json`, `.yaml`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `USERDESK_*` overrides read through `lookup`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        // API
        if let Some(url) = lookup("USERDESK_API_URL") {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("USERDESK_AUTH_URL") {
            self.api.auth_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("USERDESK_TIMEOUT_SECONDS") {
            self.api.timeout_seconds = parse_value("USERDESK_TIMEOUT_SECONDS", &secs)?;
        }

        // Auth
        if let Some(path) = lookup("USERDESK_CREDENTIALS_PATH") {
            self.auth.credentials_path = Some(path);
        }

        // Listing
        if let Some(size) = lookup("USERDESK_PAGE_SIZE") {
            let size: u32 = parse_value("USERDESK_PAGE_SIZE", &size)?;
            if size == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "USERDESK_PAGE_SIZE".into(),
                    message: "must be positive".into(),
                });
            }
            self.listing.default_page_size = size;
        }
        if let Some(country) = lookup("USERDESK_HOME_COUNTRY") {
            self.listing.home_country = country;
        }

        // Logging
        if let Some(filter) = lookup("USERDESK_LOG") {
            self.logging.filter = filter;
        }
        if let Some(v) = lookup("USERDESK_LOG_JSON") {
            self.logging.json = v == "true" || v == "1" || v == "yes";
        }

        Ok(())
    }
}

impl ApiConfig {
    /// Per-request timeout for the HTTP client
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
