//! Wind Dashboard Data Server
//!
//! Run with: cargo run --bin wind-server
//!
//! Serves samples to dashboards over Socket.IO on port 15641. See
//! `wind-server --print-config` for every setting; `RUST_LOG` overrides the
//! configured log level.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wind_dashboard::api::{serve, AppState};
use wind_dashboard::config::{generate_default_config, Config, LoggingConfig};
use wind_dashboard::source::{self, SourceKind, Streamer};

#[derive(Parser)]
#[command(name = "wind-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time wind turbine data server")]
struct Cli {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Local sample source
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// CSV recording to replay (implies --source csv)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Milliseconds between samples from the local source
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Do not re-broadcast data pushed by feeders
    #[arg(long)]
    no_relay: bool,

    /// Print the default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default(),
    };
    apply_cli_overrides(&mut config, &cli);

    init_tracing(&config.logging);

    tracing::info!("Starting wind data server v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(&config);

    // Started once for the lifetime of the server
    let stream_handle = match source::from_config(&config.stream)? {
        Some(source) => Some(
            Streamer::new(
                source,
                state.hub.clone(),
                config.stream.normalizer(),
                config.stream.interval(),
            )
            .spawn(),
        ),
        None => {
            tracing::info!("No local source configured, relaying feeder data only");
            None
        }
    };

    tracing::info!(
        event = %config.stream.event,
        relay = config.stream.relay,
        "Serving samples"
    );
    serve(state, &config.server).await?;

    if let Some(handle) = stream_handle {
        handle.abort();
    }
    tracing::info!("Wind data server stopped");

    Ok(())
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(source) = cli.source {
        config.stream.source = source;
    }
    if let Some(path) = &cli.csv {
        config.stream.source = SourceKind::Csv;
        config.stream.csv_path = Some(path.clone());
    }
    if let Some(interval) = cli.interval_ms {
        config.stream.interval_ms = interval;
    }
    if cli.no_relay {
        config.stream.relay = false;
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "wind_dashboard={level},wind_server={level},tower_http=info",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
