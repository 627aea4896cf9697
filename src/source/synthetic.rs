//! Synthetic wind-turbine-like waveforms for running without hardware.

use async_trait::async_trait;

use super::{SampleSource, SourceError};
use crate::sample::RawFrame;

/// Deterministic waveform generator
pub struct SyntheticSource {
    channels: usize,
    step: f64,
    tick: u64,
}

impl SyntheticSource {
    /// Generator producing `channels` values per frame, `step` seconds apart
    pub fn new(channels: usize, step: f64) -> Self {
        Self {
            channels,
            step,
            tick: 0,
        }
    }

    fn frame_at(&self, t: f64) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.channels + 1);
        values.push(t);
        values.extend((0..self.channels).map(|i| channel_value(i, t)));
        values
    }
}

/// Channel 0 is wind speed, 1 rotor speed, 2 power; the rest are slower
/// oscillations with per-channel phase.
fn channel_value(index: usize, t: f64) -> f64 {
    let wind = 8.0 + 2.0 * (0.1 * t).sin() + 0.5 * (0.73 * t).sin();
    match index {
        0 => wind,
        1 => 1.6 * wind,
        2 => 0.5 * wind.powi(3),
        i => {
            let i = i as f64;
            (1.0 + 0.25 * i) * (0.05 * (i + 1.0) * t + 0.35 * i).sin()
        }
    }
}

#[async_trait]
impl SampleSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        let t = self.tick as f64 * self.step;
        self.tick += 1;
        Ok(Some(RawFrame::Flat(self.frame_at(t))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_advance_by_step() {
        let mut source = SyntheticSource::new(4, 0.5);

        let first = source.next_frame().await.unwrap().unwrap();
        let second = source.next_frame().await.unwrap().unwrap();

        match (first, second) {
            (RawFrame::Flat(a), RawFrame::Flat(b)) => {
                assert_eq!(a.len(), 5);
                assert_eq!(a[0], 0.0);
                assert_eq!(b[0], 0.5);
            }
            other => panic!("Expected flat frames, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_is_deterministic() {
        let mut a = SyntheticSource::new(43, 1.0);
        let mut b = SyntheticSource::new(43, 1.0);
        for _ in 0..3 {
            assert_eq!(
                a.next_frame().await.unwrap(),
                b.next_frame().await.unwrap()
            );
        }
    }

    #[test]
    fn test_power_tracks_wind() {
        let wind = channel_value(0, 10.0);
        assert!((channel_value(2, 10.0) - 0.5 * wind.powi(3)).abs() < 1e-9);
        assert!(wind > 5.0 && wind < 11.0);
    }
}
