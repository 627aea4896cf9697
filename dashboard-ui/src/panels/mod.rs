//! Panels
//!
//! The two halves of the dashboard layout.

pub mod control;
pub mod viewing;

pub use control::ControlPanel;
pub use viewing::ViewingPanel;
