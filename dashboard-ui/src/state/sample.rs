//! Dashboard State
//!
//! Reactive holder for the most recent sample using Leptos signals.

use leptos::*;
use serde::Deserialize;

/// A single reading pushed by the data server
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    #[serde(default)]
    pub channels: Vec<f64>,
}

/// State owned by the shell and passed down to panels as props
#[derive(Clone, Copy)]
pub struct DashboardState {
    /// Latest sample; starts at timestamp 0 with no channels
    pub sample: RwSignal<Sample>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            sample: create_rw_signal(Sample::default()),
        }
    }

    /// Replace the held sample
    pub fn apply(&self, sample: Sample) {
        self.sample.set(sample);
    }

    /// Read-only view of the timestamp
    pub fn timestamp(&self) -> Signal<f64> {
        let sample = self.sample;
        Signal::derive(move || sample.with(|s| s.timestamp))
    }

    /// Read-only view of the channel values
    pub fn channels(&self) -> Signal<Vec<f64>> {
        let sample = self.sample;
        Signal::derive(move || sample.with(|s| s.channels.clone()))
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
