//! Wind Dashboard
//!
//! Live wind turbine dashboard built with Leptos (WASM).
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. The root component opens one Socket.IO connection to the
//! data server and hands the latest sample down to the viewing panel.

use leptos::*;

mod app;
mod components;
mod panels;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
