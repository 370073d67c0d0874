//! Coupon server API
//!
//! Everything the client calls lives under one domain.
//!
//! # Endpoints
//!
//! ## Auth (`/api/v1`)
//! - `POST /auth/idCheck` - Id availability
//! - `POST /mail/sendMail` - Send the verification mail
//! - `POST /mail/checkCertification` - Check the verification number
//! - `POST /auth/signUp` - Create an account
//! - `POST /auth/signIn` - Issue an access token
//! - `GET /auth/tokenDecryption` - Introspect the access token
//!
//! ## Coupons (`/api/v1`)
//! - `GET /coupons` - Running coupon events
//! - `POST /coupon-event/attempt` - Claim attempt
//!
//! ## Chat
//! - `POST /api/v1/filtering` - Send-attempt report
//! - `GET /chat` - STOMP over WebSocket
//!
//! ## Leaderboard
//! - `GET /api/categories` - Coupon categories
//! - `GET /sse/leaderboard?couponCategory=C` - Winner snapshot
//! - `GET /sse/leaderboard/stream?couponCategory=C` - Winner updates (SSE)
//!
//! # Example
//!
//! ```rust,no_run
//! use coupong::api::{CoupongClient, Endpoints};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CoupongClient::new(Endpoints::default(), Duration::from_secs(10))?;
//!     for event in client.coupon_events().await?.events() {
//!         println!("{} ({})", event.event_name, event.event_category);
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "native")]
pub mod client;
pub mod dto;
pub mod endpoints;
#[cfg(feature = "native")]
pub mod error;

#[cfg(feature = "native")]
pub use client::CoupongClient;
pub use dto::{IssuedToken, ResponseBody, SignInResponse, UserInfo};
pub use endpoints::{Endpoints, DEFAULT_DOMAIN};
#[cfg(feature = "native")]
pub use error::ApiError;
