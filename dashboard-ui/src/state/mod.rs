//! State Management
//!
//! The latest sample held by the shell, and the Socket.IO connection that
//! keeps it current.

pub mod sample;
pub mod socket;

pub use sample::{DashboardState, Sample};
pub use socket::{BrowserConnector, Shell, DATA_SERVER_URL};
