//! Coupon drops
//!
//! Listing of running events and the claim flow for a single category.

pub mod claim;
pub mod events;

pub use claim::{ClaimOutcome, ClaimPanel, ClaimRequest, Overlay};
pub use events::{CouponEvent, EventListing, EventTime, Logo};
