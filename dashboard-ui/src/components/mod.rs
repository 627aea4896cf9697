//! UI Components
//!
//! Reusable Leptos components for the dashboard.

pub mod plot_placeholder;

pub use plot_placeholder::PlotPlaceholder;
