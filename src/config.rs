//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sample::{FrameNormalizer, DEFAULT_MAX_CHANNELS, DEFAULT_MAX_TIMESTAMP};
use crate::socketio::{HubConfig, SocketOptions};
use crate::source::SourceKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP / socket server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_ping_interval")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    15641
}

fn default_max_connections() -> usize {
    1000
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            ping_interval_ms: default_ping_interval(),
            ping_timeout_ms: default_ping_timeout(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sample stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Event name samples are emitted under
    #[serde(default = "default_event")]
    pub event: String,

    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Channel cap; 0 disables truncation
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,

    /// Exclusive timestamp bound; 0 or less forwards every timestamp
    #[serde(default = "default_max_timestamp")]
    pub max_timestamp: f64,

    /// Re-broadcast data events pushed by feeders
    #[serde(default = "default_relay")]
    pub relay: bool,

    #[serde(default)]
    pub source: SourceKind,

    /// Channel count of the synthetic source
    #[serde(default = "default_max_channels")]
    pub channels: usize,

    pub csv_path: Option<PathBuf>,

    #[serde(default = "default_csv_header")]
    pub csv_header: bool,

    #[serde(default = "default_csv_loop")]
    pub csv_loop: bool,
}

fn default_event() -> String {
    "data".to_string()
}

fn default_interval() -> u64 {
    1000
}

fn default_max_channels() -> usize {
    DEFAULT_MAX_CHANNELS
}

fn default_max_timestamp() -> f64 {
    DEFAULT_MAX_TIMESTAMP
}

fn default_relay() -> bool {
    true
}

fn default_csv_header() -> bool {
    true
}

fn default_csv_loop() -> bool {
    true
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            event: default_event(),
            interval_ms: default_interval(),
            max_channels: default_max_channels(),
            max_timestamp: default_max_timestamp(),
            relay: default_relay(),
            source: SourceKind::default(),
            channels: default_max_channels(),
            csv_path: None,
            csv_header: default_csv_header(),
            csv_loop: default_csv_loop(),
        }
    }
}

impl StreamConfig {
    /// Frame normalizer for this stream
    pub fn normalizer(&self) -> FrameNormalizer {
        FrameNormalizer {
            max_channels: (self.max_channels > 0).then_some(self.max_channels),
            max_timestamp: (self.max_timestamp > 0.0).then_some(self.max_timestamp),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
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

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
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
            dirs::config_dir().map(|p| p.join("wind-dashboard").join("config.toml")),
            Some(PathBuf::from("/etc/wind-dashboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("WIND_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("WIND_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(source) = var("WIND_SOURCE") {
            match source.to_lowercase().as_str() {
                "synthetic" => self.stream.source = SourceKind::Synthetic,
                "csv" => self.stream.source = SourceKind::Csv,
                "none" => self.stream.source = SourceKind::None,
                other => tracing::warn!("Ignoring unknown WIND_SOURCE {:?}", other),
            }
        }
        if let Some(path) = var("WIND_CSV_PATH") {
            self.stream.csv_path = Some(PathBuf::from(path));
        }

        if let Some(level) = var("WIND_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("WIND_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Hub settings derived from this config
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            max_connections: self.server.max_connections,
            event: self.stream.event.clone(),
        }
    }

    /// Per-socket session settings derived from this config
    pub fn socket_options(&self) -> SocketOptions {
        SocketOptions {
            // A zero period would stall the heartbeat timer
            ping_interval: Duration::from_millis(self.server.ping_interval_ms.max(1)),
            ping_timeout: Duration::from_millis(self.server.ping_timeout_ms),
            relay: self.stream.relay,
            ..Default::default()
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
    r#"# Wind Dashboard Configuration
#
# Environment variables override these settings:
# - WIND_HOST
# - WIND_PORT
# - WIND_SOURCE
# - WIND_CSV_PATH
# - WIND_LOG_LEVEL
# - WIND_LOG_FORMAT

[server]
# Address the data server binds to
host = "0.0.0.0"
port = 15641

# Maximum concurrent sockets
max_connections = 1000

# Engine heartbeat (ms)
ping_interval_ms = 25000
ping_timeout_ms = 20000

[stream]
# Event name samples are emitted under
event = "data"

# How often the local source is read (ms)
interval_ms = 1000

# Forward at most this many channels per sample (0 = all)
max_channels = 43

# Drop samples at or above this timestamp (0 = no filter)
max_timestamp = 40000.0

# Re-broadcast data events pushed by feeders
relay = true

# Local source: synthetic, csv or none
source = "synthetic"

# Channel count for the synthetic source
channels = 43

# CSV recording (source = "csv")
# csv_path = "frames.csv"
csv_header = true
csv_loop = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
