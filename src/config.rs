//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::endpoints::{Endpoints, CHAT_PATH, DEFAULT_DOMAIN};
use crate::leaderboard::RECONNECT_DELAY;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Coupon server location
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.domain)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// STOMP chat channel
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_path")]
    pub path: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long to wait for the DISCONNECT receipt on exit
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_ms: u64,
}

fn default_chat_path() -> String {
    CHAT_PATH.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_shutdown_timeout() -> u64 {
    2000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            path: default_chat_path(),
            connect_timeout_secs: default_connect_timeout(),
            shutdown_timeout_ms: default_shutdown_timeout(),
        }
    }
}

/// Leaderboard event stream
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_reconnect_delay() -> u64 {
    RECONNECT_DELAY.as_millis() as u64
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Where the cookie jar lives
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("coupong").to_string_lossy().to_string())
        .unwrap_or_else(|| "./coupong_data".to_string())
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("coupong").join("config.toml")),
            Some(PathBuf::from("/etc/coupong/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `COUPONG_*` overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(domain) = lookup("COUPONG_DOMAIN") {
            self.server.domain = domain;
        }
        if let Some(timeout) = lookup("COUPONG_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.server.request_timeout_secs = secs;
            }
        }
        if let Some(data_dir) = lookup("COUPONG_DATA_DIR") {
            self.session.data_dir = data_dir;
        }
        if let Some(level) = lookup("COUPONG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("COUPONG_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Cookie jar directory, with a leading `~/` expanded
    pub fn data_dir(&self) -> PathBuf {
        match self.session.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.session.data_dir)),
            None => PathBuf::from(&self.session.data_dir),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Coupong Configuration
#
# Environment variables override these settings:
# - COUPONG_DOMAIN
# - COUPONG_REQUEST_TIMEOUT_SECS
# - COUPONG_DATA_DIR
# - COUPONG_LOG_LEVEL
# - COUPONG_LOG_FORMAT

[server]
# Coupon server; REST lives under <domain>/api/v1
domain = "http://localhost:4040"

# Request timeout in seconds
request_timeout_secs = 30

[chat]
# STOMP WebSocket endpoint path
path = "/chat"

connect_timeout_secs = 10

# Wait for the DISCONNECT receipt on exit (ms)
shutdown_timeout_ms = 2000

[leaderboard]
# Fixed delay before reopening a dropped event stream (ms)
reconnect_delay_ms = 3000

connect_timeout_secs = 10

[session]
# Directory holding the cookie jar
data_dir = "~/.local/share/coupong"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.domain, "http://localhost:4040");
        assert_eq!(config.chat.path, "/chat");
        assert_eq!(config.leaderboard.reconnect_delay_ms, 3000);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(
            config.server.endpoints().api_root(),
            "http://localhost:4040/api/v1"
        );
    }

    #[test]
    fn test_generated_config_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, generate_default_config()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.chat.shutdown_timeout_ms, 2000);
        assert_eq!(config.session.data_dir, "~/.local/share/coupong");
    }

    #[test]
    fn test_partial_file_and_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ndomain = \"https://coupong.example.com\"\n").unwrap();

        let mut config = Config::load(&path).unwrap();
        assert_eq!(config.server.domain, "https://coupong.example.com");
        assert_eq!(config.leaderboard.reconnect_delay_ms, 3000);

        let env: HashMap<&str, &str> = [
            ("COUPONG_LOG_LEVEL", "debug"),
            ("COUPONG_REQUEST_TIMEOUT_SECS", "not a number"),
            ("COUPONG_DATA_DIR", "/tmp/coupong"),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/coupong"));
    }

    #[test]
    fn test_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
