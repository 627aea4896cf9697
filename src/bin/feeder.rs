//! Wind Dashboard Feeder
//!
//! Run with: cargo run --bin wind-feeder -- --url http://server:15641
//!
//! Reads samples from a local source and pushes them to a remote data
//! server as Socket.IO events, reconnecting every two seconds on failure.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wind_dashboard::feeder::{Feeder, FeederConfig};
use wind_dashboard::sample::FrameNormalizer;
use wind_dashboard::source::{CsvReplaySource, SampleSource, SyntheticSource};

#[derive(Parser)]
#[command(name = "wind-feeder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Push wind turbine samples to a remote data server")]
struct Cli {
    /// Data server base URL
    #[arg(short, long, default_value = "http://localhost:15641")]
    url: String,

    /// CSV recording to replay (default: synthetic waveforms)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// The CSV recording has no header row
    #[arg(long)]
    no_header: bool,

    /// Replay the CSV recording in a loop
    #[arg(long = "loop")]
    repeat: bool,

    /// Channel count of the synthetic source
    #[arg(long, default_value_t = 43)]
    channels: usize,

    /// Forward at most this many channels (0 = all)
    #[arg(long, default_value_t = 0)]
    max_channels: usize,

    /// Milliseconds between samples
    #[arg(long, default_value_t = 10)]
    interval_ms: u64,

    /// Event name to emit
    #[arg(short, long, default_value = "data")]
    event: String,

    /// Log every n-th sample (0 = never)
    #[arg(long, default_value_t = 500)]
    log_every: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wind_dashboard=info,wind_feeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let interval = Duration::from_millis(cli.interval_ms.max(1));

    let source: Box<dyn SampleSource> = match &cli.csv {
        Some(path) => Box::new(
            CsvReplaySource::open(path, !cli.no_header, cli.repeat)
                .with_context(|| format!("Failed to load recording {:?}", path))?,
        ),
        None => Box::new(SyntheticSource::new(cli.channels, interval.as_secs_f64())),
    };

    let normalizer = FrameNormalizer {
        max_channels: (cli.max_channels > 0).then_some(cli.max_channels),
        max_timestamp: None,
    };

    let config = FeederConfig {
        url: cli.url,
        event: cli.event,
        interval,
        log_every: cli.log_every,
        ..Default::default()
    };

    tracing::info!(
        url = %config.url,
        source = %source.name(),
        "Starting wind feeder v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut feeder = Feeder::new(source, normalizer, config);
    tokio::select! {
        result = feeder.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Terminated by user"),
    }

    tracing::info!(sent = feeder.sent(), "Feeder stopped");
    Ok(())
}
