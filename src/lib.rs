//! # Coupong
//!
//! Client for the Coupong coupon-drop platform: sign in, claim coupons from
//! running events, follow the live winner leaderboard and chat with the
//! other participants.
//!
//! ## Features
//!
//! - **Forms**: sign-up gating on id check and email certification
//! - **Coupons**: event listing and claim attempts with server verdicts
//! - **Leaderboard**: HTTP snapshots plus a server-sent event stream
//! - **Chat**: STOMP 1.2 over WebSocket with send-attempt reporting
//!
//! ## Modules
//!
//! - [`auth`]: Form validation, response codes, cookie jar and session
//! - [`api`]: Endpoint URLs, wire DTOs and the REST client
//! - [`coupon`]: Event listing and claim flow
//! - [`leaderboard`]: Event-stream decoding, payloads and board state
//! - [`chat`]: STOMP codec, chat payloads and the room client
//!
//! Everything except the network clients, the cookie jar and configuration
//! builds without the default `native` feature, which is how the browser
//! front end uses this crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coupong::api::CoupongClient;
//! use coupong::auth::{CookieJar, Session, SignInForm};
//! use coupong::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = CoupongClient::new(
//!         config.server.endpoints(),
//!         config.server.request_timeout(),
//!     )?;
//!
//!     let mut session = Session::new(&client, CookieJar::open(&config.data_dir())?);
//!     let request = SignInForm::new("alice", "secret123").submit()?;
//!     let feedback = session.sign_in(&request).await?;
//!     println!("{}", feedback.message);
//!
//!     let user = session.current_user().await?;
//!     println!("Hello, {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod chat;
#[cfg(feature = "native")]
pub mod config;
pub mod coupon;
pub mod leaderboard;

#[cfg(all(test, feature = "native"))]
mod testing;

// Re-export top-level types for convenience
pub use api::{Endpoints, IssuedToken, ResponseBody, SignInResponse, UserInfo};
#[cfg(feature = "native")]
pub use api::{ApiError, CoupongClient};

pub use auth::{AuthStep, Feedback, ResponseCode, SignInForm, SignUpBlocker, SignUpForm};
#[cfg(feature = "native")]
pub use auth::{CookieError, CookieJar, Session, SessionError};

pub use coupon::{ClaimOutcome, ClaimPanel, CouponEvent, EventListing};

pub use leaderboard::{Leaderboard, Selection, Winner, WinnerUpdate};
#[cfg(feature = "native")]
pub use leaderboard::{LeaderboardSubscriber, StreamEvent, StreamHandle};

pub use chat::{ChatInput, ChatMessage, Frame, FrameDecoder, StompError};
#[cfg(feature = "native")]
pub use chat::{ChatError, ChatEvent, ChatRoom, ChatRoomConfig};

#[cfg(feature = "native")]
pub use config::{Config, ConfigError, LoggingConfig};
