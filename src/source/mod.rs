//! Sample Sources
//!
//! Where the server's samples come from. Acquisition hardware is read
//! through the [`SampleSource`] trait; the built-in sources are a synthetic
//! waveform generator and a CSV replay of recorded frames.

mod csv_replay;
mod streamer;
mod synthetic;

pub use csv_replay::CsvReplaySource;
pub use streamer::{StepOutcome, Streamer};
pub use synthetic::SyntheticSource;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::StreamConfig;
use crate::sample::RawFrame;

/// A producer of raw frames
#[async_trait]
pub trait SampleSource: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Read the next frame
    ///
    /// `Ok(None)` means the source is exhausted and will not produce more.
    async fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError>;
}

/// Built-in source kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Generated waveforms
    Synthetic,
    /// Replay of a CSV recording
    Csv,
    /// No local source; relay only
    None,
}

impl Default for SourceKind {
    fn default() -> Self {
        SourceKind::Synthetic
    }
}

/// Build the source selected by a stream configuration
///
/// Returns `None` for a relay-only server.
pub fn from_config(stream: &StreamConfig) -> Result<Option<Box<dyn SampleSource>>, SourceError> {
    match stream.source {
        SourceKind::Synthetic => Ok(Some(Box::new(SyntheticSource::new(
            stream.channels,
            stream.interval().as_secs_f64(),
        )))),
        SourceKind::Csv => {
            let path = stream.csv_path.as_ref().ok_or_else(|| {
                SourceError::Unavailable("csv source requires csv_path".to_string())
            })?;
            Ok(Some(Box::new(CsvReplaySource::open(
                path,
                stream.csv_header,
                stream.csv_loop,
            )?)))
        }
        SourceKind::None => Ok(None),
    }
}

/// Errors raised by sample sources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {path:?}: {error}")]
    Open { path: PathBuf, error: String },

    #[error("Invalid value {value:?} at line {line}, column {column}")]
    InvalidValue {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut stream = StreamConfig::default();
        let source = from_config(&stream).unwrap().unwrap();
        assert_eq!(source.name(), "synthetic");

        stream.source = SourceKind::None;
        assert!(from_config(&stream).unwrap().is_none());

        stream.source = SourceKind::Csv;
        assert!(matches!(
            from_config(&stream),
            Err(SourceError::Unavailable(_))
        ));
    }
}
