//! State Management
//!
//! Global state plus the browser-side connections: the token cookie, the
//! leaderboard event stream and the STOMP chat socket.

pub mod cookie;
pub mod event_source;
pub mod global;
pub mod stomp_socket;

pub use global::{provide_global_state, GlobalState};
