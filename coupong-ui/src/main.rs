//! Coupong Web
//!
//! Browser client of the Coupong coupon platform, built with Leptos (WASM).
//!
//! # Features
//!
//! - Sign-in and sign-up with email verification
//! - Coupon event list with claim attempts
//! - Live winner leaderboard over server-sent events
//! - Chat room over STOMP/WebSocket
//!
//! # Architecture
//!
//! A client-side rendered (CSR) Leptos application. Form rules, wire types,
//! the STOMP codec and the leaderboard state come from the `coupong` crate;
//! this crate wires them to the DOM, `fetch`, `EventSource` and `WebSocket`.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
