//! App Root Component
//!
//! Owns the dashboard state and the connection to the data server.

use leptos::logging::error;
use leptos::*;

use crate::panels::{ControlPanel, ViewingPanel};
use crate::state::{BrowserConnector, DashboardState, Shell, DATA_SERVER_URL};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let state = DashboardState::new();

    // One connection for the lifetime of the component
    match Shell::mount(&BrowserConnector, DATA_SERVER_URL, state) {
        Ok(mut shell) => on_cleanup(move || shell.teardown()),
        Err(e) => error!("Failed to connect to data server: {}", e),
    }

    view! {
        <div class="container">
            <ControlPanel />
            <ViewingPanel timestamp=state.timestamp() channels=state.channels() />
        </div>
    }
}
