//! Streamer
//!
//! Background task that pulls frames from a source on a fixed cadence and
//! publishes the accepted samples through the hub.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SampleSource, SourceError};
use crate::sample::FrameNormalizer;
use crate::socketio::SocketHub;

/// Result of a single streamer step
#[derive(Debug, PartialEq)]
pub enum StepOutcome {
    /// Sample published to this many sockets
    Published(usize),
    /// Frame was empty or rejected by the timestamp filter
    Skipped,
    /// Source has no more frames
    Exhausted,
}

/// Drives one source into the hub
pub struct Streamer {
    source: Box<dyn SampleSource>,
    hub: SocketHub,
    normalizer: FrameNormalizer,
    interval: Duration,
}

impl Streamer {
    pub fn new(
        source: Box<dyn SampleSource>,
        hub: SocketHub,
        normalizer: FrameNormalizer,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            hub,
            normalizer,
            interval,
        }
    }

    /// Start streaming in the background
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Stream until the source is exhausted
    pub async fn run(mut self) {
        tracing::info!(
            source = %self.source.name(),
            event = %self.hub.event(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting sample stream"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.step().await {
                Ok(StepOutcome::Exhausted) => {
                    tracing::info!(source = %self.source.name(), "Source exhausted, stream stopped");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(source = %self.source.name(), error = %e, "Failed to read frame");
                }
            }
        }
    }

    /// Read, normalize and publish one frame
    pub async fn step(&mut self) -> Result<StepOutcome, SourceError> {
        let frame = match self.source.next_frame().await? {
            Some(frame) => frame,
            None => return Ok(StepOutcome::Exhausted),
        };

        let sample = match self.normalizer.process(frame) {
            Some(sample) => sample,
            None => return Ok(StepOutcome::Skipped),
        };

        match self.hub.publish(sample).await {
            Ok(delivered) => Ok(StepOutcome::Published(delivered)),
            Err(e) => Err(SourceError::Unavailable(e.to_string())),
        }
    }
}
