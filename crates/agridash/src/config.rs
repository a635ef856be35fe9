//! Configuration management for agridash.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "agridash";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "observations.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AGRIDASH_`, sections split on `__`,
///    e.g. `AGRIDASH_SERVER__PORT=8080`)
/// 2. TOML config file at `~/.config/agridash/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Dashboard client configuration.
    pub client: ClientConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/agridash/observations.db`
    pub database_path: Option<PathBuf>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Browser origin allowed to call the API (`*` for any).
    pub allowed_origin: String,
    /// Observations buffered per event-stream subscriber before it lags.
    pub broadcast_capacity: usize,
    /// Seconds between keep-alive comments on the event stream.
    pub keep_alive_secs: u64,
}

/// Dashboard client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the agridash server.
    pub base_url: String,
    /// Delay before reconnecting a dropped event stream, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Timeout for list and submit requests, in milliseconds.
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    /// Interval between keep-alive comments, at least one second.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origin: "http://localhost:3000".to_string(),
            broadcast_capacity: crate::notify::DEFAULT_CAPACITY,
            keep_alive_secs: 15,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            reconnect_delay_ms: 2000,
            request_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("AGRIDASH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(invalid("server.host must not be empty"));
        }

        if self.server.broadcast_capacity == 0 {
            return Err(invalid("server.broadcast_capacity must be greater than 0"));
        }

        if self.server.keep_alive_secs == 0 {
            return Err(invalid("server.keep_alive_secs must be greater than 0"));
        }

        if self.server.allowed_origin != "*"
            && HeaderValue::from_str(&self.server.allowed_origin).is_err()
        {
            return Err(invalid(format!(
                "server.allowed_origin is not a valid origin: {}",
                self.server.allowed_origin
            )));
        }

        let base_url = self.client.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(invalid(format!(
                "client.base_url must be an http(s) URL: {base_url}"
            )));
        }

        if self.client.reconnect_delay_ms == 0 {
            return Err(invalid("client.reconnect_delay_ms must be greater than 0"));
        }

        if self.client.request_timeout_ms == 0 {
            return Err(invalid("client.request_timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the `host:port` address the server binds.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get the reconnect delay as a Duration.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.client.reconnect_delay_ms)
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.client.request_timeout_ms)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
