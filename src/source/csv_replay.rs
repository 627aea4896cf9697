//! CSV Replay
//!
//! Replays frames recorded as CSV: one row per frame, timestamp first,
//! channel values after it. Rows may have different lengths.

use async_trait::async_trait;
use std::io::Read;
use std::path::Path;

use super::{SampleSource, SourceError};
use crate::sample::RawFrame;

/// Frame source backed by a CSV recording
pub struct CsvReplaySource {
    frames: Vec<Vec<f64>>,
    position: usize,
    repeat: bool,
}

impl CsvReplaySource {
    /// Load a recording from disk
    pub fn open(path: &Path, has_header: bool, repeat: bool) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let source = Self::from_reader(file, has_header, repeat)?;

        tracing::info!(path = ?path, frames = source.len(), "Loaded CSV recording");
        Ok(source)
    }

    /// Load a recording from any reader
    pub fn from_reader<R: Read>(reader: R, has_header: bool, repeat: bool) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(has_header)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut frames = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let row = record
                .iter()
                .enumerate()
                .filter(|(_, field)| !field.is_empty())
                .map(|(column, field)| {
                    field.parse::<f64>().map_err(|_| SourceError::InvalidValue {
                        line,
                        column,
                        value: field.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            if !row.is_empty() {
                frames.push(row);
            }
        }

        Ok(Self {
            frames,
            position: 0,
            repeat,
        })
    }

    /// Number of frames in the recording
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the recording holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl SampleSource for CsvReplaySource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        if self.position >= self.frames.len() {
            if !self.repeat || self.frames.is_empty() {
                return Ok(None);
            }
            self.position = 0;
        }

        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(Some(RawFrame::Flat(frame)))
    }
}
