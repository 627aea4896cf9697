//! Viewing Panel
//!
//! Chart placeholder above the latest timestamp.

use leptos::*;

use crate::components::PlotPlaceholder;

/// Heading text for a timestamp
pub fn timestamp_label(timestamp: f64) -> String {
    format!("Timestamp: {}", timestamp)
}

/// Stateless layout of the latest sample
#[component]
pub fn ViewingPanel(
    #[prop(into)] timestamp: Signal<f64>,
    /// Latest channel values; not plotted yet
    #[prop(into)]
    channels: Signal<Vec<f64>>,
) -> impl IntoView {
    let _ = channels;

    view! {
        <section class="panel viewing-panel">
            <PlotPlaceholder />
            <h2>{move || timestamp_label(timestamp.get())}</h2>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_label() {
        assert_eq!(timestamp_label(42.0), "Timestamp: 42");
        assert_eq!(timestamp_label(0.0), "Timestamp: 0");
        assert_eq!(timestamp_label(1234.5), "Timestamp: 1234.5");
    }
}
