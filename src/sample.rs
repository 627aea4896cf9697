//! Sample Model
//!
//! The unit of data flowing from acquisition to the dashboard: one timestamp
//! plus an ordered list of channel values.

use serde::{Deserialize, Serialize};

/// Default cap on the number of channels forwarded per sample
pub const DEFAULT_MAX_CHANNELS: usize = 43;

/// Default upper bound (exclusive) on accepted timestamps
pub const DEFAULT_MAX_TIMESTAMP: f64 = 40000.0;

/// A single reading: timestamp followed by channel values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp as reported by the acquisition device
    pub timestamp: f64,
    /// Channel values, in device order
    #[serde(default)]
    pub channels: Vec<f64>,
}

impl Sample {
    /// Create a sample
    pub fn new(timestamp: f64, channels: Vec<f64>) -> Self {
        Self { timestamp, channels }
    }
}

/// A frame as read from a source, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    /// One flat row: `[timestamp, ch1, ch2, ...]`
    Flat(Vec<f64>),
    /// A block of rows. The first row holds the timestamp, the rest are channels.
    Rows(Vec<Vec<f64>>),
}

impl RawFrame {
    /// Total number of values in the frame
    pub fn len(&self) -> usize {
        match self {
            RawFrame::Flat(values) => values.len(),
            RawFrame::Rows(rows) => rows.iter().map(Vec::len).sum(),
        }
    }

    /// Whether the frame carries no values at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns raw frames into samples and decides which samples get forwarded
#[derive(Debug, Clone)]
pub struct FrameNormalizer {
    /// Keep at most this many channels
    pub max_channels: Option<usize>,
    /// Drop samples whose timestamp is not below this bound
    pub max_timestamp: Option<f64>,
}

impl Default for FrameNormalizer {
    fn default() -> Self {
        Self {
            max_channels: Some(DEFAULT_MAX_CHANNELS),
            max_timestamp: Some(DEFAULT_MAX_TIMESTAMP),
        }
    }
}

impl FrameNormalizer {
    /// Normalizer that keeps every channel and every timestamp
    pub fn passthrough() -> Self {
        Self {
            max_channels: None,
            max_timestamp: None,
        }
    }

    /// Convert a raw frame into a sample
    ///
    /// Returns `None` for an empty frame.
    pub fn normalize(&self, frame: RawFrame) -> Option<Sample> {
        if frame.is_empty() {
            return None;
        }

        let (timestamp, mut channels) = match frame {
            RawFrame::Flat(values) => split_flat(values)?,
            RawFrame::Rows(mut rows) => {
                rows.retain(|row| !row.is_empty());
                if rows.len() == 1 {
                    split_flat(rows.remove(0))?
                } else {
                    let mut rows = rows.into_iter();
                    let head = rows.next()?;
                    let timestamp = if head.len() == 1 {
                        head[0]
                    } else {
                        head.iter().sum::<f64>() / head.len() as f64
                    };
                    (timestamp, rows.flatten().collect())
                }
            }
        };

        if let Some(max) = self.max_channels {
            channels.truncate(max);
        }

        Some(Sample::new(timestamp, channels))
    }

    /// Whether a sample should be forwarded
    pub fn accepts(&self, sample: &Sample) -> bool {
        match self.max_timestamp {
            Some(max) => sample.timestamp < max,
            None => true,
        }
    }

    /// Normalize and filter in one step
    pub fn process(&self, frame: RawFrame) -> Option<Sample> {
        self.normalize(frame).filter(|sample| self.accepts(sample))
    }
}

fn split_flat(mut values: Vec<f64>) -> Option<(f64, Vec<f64>)> {
    if values.is_empty() {
        return None;
    }
    let channels = values.split_off(1);
    Some((values[0], channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_flat_frame() {
        let normalizer = FrameNormalizer::default();
        let sample = normalizer
            .normalize(RawFrame::Flat(vec![12.5, 1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(sample.timestamp, 12.5);
        assert_eq!(sample.channels, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_normalize_empty_frame() {
        let normalizer = FrameNormalizer::default();
        assert!(normalizer.normalize(RawFrame::Flat(vec![])).is_none());
        assert!(normalizer.normalize(RawFrame::Rows(vec![])).is_none());
        assert!(normalizer.normalize(RawFrame::Rows(vec![vec![]])).is_none());
    }

    #[test]
    fn test_single_row_block_is_flattened() {
        let normalizer = FrameNormalizer::default();
        let sample = normalizer
            .normalize(RawFrame::Rows(vec![vec![3.0, 4.0, 5.0]]))
            .unwrap();
        assert_eq!(sample, Sample::new(3.0, vec![4.0, 5.0]));
    }

    #[test]
    fn test_multi_row_block_averages_timestamp_row() {
        let normalizer = FrameNormalizer::default();
        let sample = normalizer
            .normalize(RawFrame::Rows(vec![
                vec![10.0, 20.0],
                vec![1.0, 2.0],
                vec![3.0],
            ]))
            .unwrap();
        assert_eq!(sample.timestamp, 15.0);
        assert_eq!(sample.channels, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_channels_truncated_to_cap() {
        let normalizer = FrameNormalizer::default();
        let mut values = vec![1.0];
        values.extend((0..60).map(f64::from));

        let sample = normalizer.normalize(RawFrame::Flat(values)).unwrap();
        assert_eq!(sample.channels.len(), DEFAULT_MAX_CHANNELS);
        assert_eq!(sample.channels[42], 42.0);
    }

    #[test]
    fn test_passthrough_keeps_everything() {
        let normalizer = FrameNormalizer::passthrough();
        let mut values = vec![50000.0];
        values.extend((0..60).map(f64::from));

        let sample = normalizer.process(RawFrame::Flat(values)).unwrap();
        assert_eq!(sample.channels.len(), 60);
    }

    #[test]
    fn test_timestamp_filter() {
        let normalizer = FrameNormalizer::default();
        assert!(normalizer.accepts(&Sample::new(39999.9, vec![])));
        assert!(!normalizer.accepts(&Sample::new(40000.0, vec![])));
        assert!(normalizer
            .process(RawFrame::Flat(vec![41000.0, 1.0]))
            .is_none());
    }

    #[test]
    fn test_sample_json_shape() {
        let sample = Sample::new(7.0, vec![1.0, 2.0, 3.0]);
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["timestamp"], 7.0);
        assert_eq!(json["channels"].as_array().unwrap().len(), 3);

        let parsed: Sample = serde_json::from_str(r#"{"timestamp": 42}"#).unwrap();
        assert_eq!(parsed, Sample::new(42.0, vec![]));
    }
}
