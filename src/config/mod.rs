//! Configuration module for the campus directory backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for admin API authentication
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to the JSON document holding installation-local state (read notifications)
    pub local_state_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How often the notification poller re-fetches
    pub poll_interval: Duration,
}

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.var, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("CAMPUS_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("CAMPUS_DB_PATH")
            .unwrap_or_else(|_| "./data/campus.sqlite".to_string())
            .into();

        let local_state_path = env::var("CAMPUS_LOCAL_STATE_PATH")
            .unwrap_or_else(|_| "./data/local-state.json".to_string())
            .into();

        let bind_raw =
            env::var("CAMPUS_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError {
            var: "CAMPUS_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let log_level = env::var("CAMPUS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let poll_raw = env::var("CAMPUS_POLL_INTERVAL_SECS").unwrap_or_else(|_| "10".to_string());
        let poll_secs: u64 = poll_raw
            .parse()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| ConfigError {
                var: "CAMPUS_POLL_INTERVAL_SECS",
                value: poll_raw.clone(),
            })?;

        Ok(Self {
            api_psk,
            db_path,
            local_state_path,
            bind_addr,
            log_level,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}
