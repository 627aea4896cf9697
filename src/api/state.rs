//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::config::Config;
use crate::socketio::{HubConfig, SocketHub, SocketOptions};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Socket hub fanning samples out to clients
    pub hub: SocketHub,
    /// Per-socket session settings
    pub socket_options: SocketOptions,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Wall-clock start time reported by the health endpoint
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(hub: SocketHub, socket_options: SocketOptions) -> Self {
        Self {
            hub,
            socket_options,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Create AppState from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(SocketHub::new(config.hub_config()), config.socket_options())
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SocketHub::new(HubConfig::default()), SocketOptions::default())
    }
}
