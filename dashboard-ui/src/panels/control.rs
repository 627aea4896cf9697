//! Control Panel
//!
//! Placeholder for acquisition controls.

use leptos::*;

#[component]
pub fn ControlPanel() -> impl IntoView {
    view! {
        <section class="panel control-panel">
            <h2>"Controls"</h2>
        </section>
    }
}
