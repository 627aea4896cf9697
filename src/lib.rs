//! # Wind Dashboard
//!
//! Real-time wind turbine data server. Samples (a timestamp plus channel
//! values) are read from a source and pushed to browser dashboards over
//! Socket.IO; remote feeders can push samples in for relaying.
//!
//! ## Modules
//!
//! - [`sample`]: Sample model and frame normalization
//! - [`socketio`]: Socket.IO protocol, socket hub and handler
//! - [`source`]: Sample sources and the streaming task
//! - [`api`]: HTTP server with Axum
//! - [`feeder`]: Client that pushes samples to a remote server
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use wind_dashboard::api::{serve, AppState};
//! use wind_dashboard::config::Config;
//! use wind_dashboard::sample::FrameNormalizer;
//! use wind_dashboard::source::{Streamer, SyntheticSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let state = AppState::from_config(&config);
//!
//!     // One sample per second from the synthetic generator
//!     Streamer::new(
//!         Box::new(SyntheticSource::new(43, 1.0)),
//!         state.hub.clone(),
//!         FrameNormalizer::default(),
//!         Duration::from_secs(1),
//!     )
//!     .spawn();
//!
//!     serve(state, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod feeder;
pub mod sample;
pub mod socketio;
pub mod source;

// Re-export top-level types for convenience
pub use sample::{FrameNormalizer, RawFrame, Sample};

pub use socketio::{
    engine_url, EnginePacket, HubConfig, HubError, PacketError, SocketHub, SocketOptions,
    SocketPacket,
};

pub use source::{
    CsvReplaySource, SampleSource, SourceError, SourceKind, StepOutcome, Streamer,
    SyntheticSource,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig, StreamConfig};

pub use feeder::{Feeder, FeederConfig, FeederError};
