//! Live winner leaderboard
//!
//! Snapshots over plain HTTP, updates over a server-sent event stream.

use std::time::Duration;

pub mod board;
pub mod payload;
pub mod sse;
#[cfg(feature = "native")]
pub mod subscriber;

pub use board::{Leaderboard, Medal, Selection};
pub use payload::{parse_snapshot, parse_update, Winner, WinnerUpdate};
pub use sse::{EventStreamDecoder, SseEvent};
#[cfg(feature = "native")]
pub use subscriber::{LeaderboardSubscriber, StreamEvent, StreamHandle};

/// Fixed wait before reopening a dropped stream
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);
