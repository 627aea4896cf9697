//! Data Transfer Objects
//!
//! Response types for the HTTP endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sample::Sample;

/// Latest sample response
#[derive(Debug, Serialize)]
pub struct LatestSampleResponse {
    /// Most recently published sample, if any
    pub data: Option<Sample>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, idle
    pub status: String,
    /// Open sockets
    pub connections: usize,
    /// Sockets joined to the default namespace
    pub clients: usize,
    /// Samples published since start
    pub samples_published: u64,
    /// Server start time
    pub started_at: DateTime<Utc>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
