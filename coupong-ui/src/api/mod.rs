//! API Client
//!
//! `fetch` wrappers around the coupon server's REST endpoints.

pub mod client;

pub use client::*;
