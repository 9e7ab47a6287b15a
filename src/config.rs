//! Configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// JSON document holding tasks, sessions, settings and snapshots
    pub data_path: PathBuf,
    /// Directory served at `/`
    pub static_dir: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_path: PathBuf::from("data/db.json"),
            static_dir: PathBuf::from("static"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separate from from_env so tests don't touch process state
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("POMODORO_STATS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("POMODORO_STATS_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(path) = lookup("POMODORO_STATS_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("POMODORO_STATS_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("POMODORO_STATS_LOG_LEVEL") {
            config.log_level = level;
        }

        config.bind_addr()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    pub fn log_summary(&self) {
        info!(
            host = %self.host,
            port = self.port,
            data_path = %self.data_path.display(),
            static_dir = %self.static_dir.display(),
            "configuration loaded"
        );
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),
}
