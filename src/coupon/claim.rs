//! Coupon claim attempts
//!
//! The server adjudicates every attempt; the client only turns the answer
//! into the modal the user sees and keeps the apply buttons locked while a
//! request, a modal or the progress overlay is showing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the progress overlay shows before the success modal
pub const PROGRESS_DURATION: Duration = Duration::from_secs(7);

pub const PROGRESS_MESSAGE: &str = "Processing your coupon request...";

pub const ACCEPTED_MESSAGE: &str =
    "Your coupon request was received! Check the leaderboard for the results.";

/// Body of `POST /coupon-event/attempt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    /// Always 0; the server resolves the user from the token
    pub id: i64,
    pub coupon_category: String,
    /// Client clock in epoch millis at the moment of the click
    pub attempt_at: i64,
    pub username: String,
}

impl ClaimRequest {
    pub fn new(coupon_category: &str, username: &str, attempt_at: i64) -> Self {
        Self {
            id: 0,
            coupon_category: coupon_category.to_string(),
            attempt_at,
            username: username.to_string(),
        }
    }
}

/// Server verdict on an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Accepted,
    /// 400
    NotStarted,
    /// 406
    AlreadyEntered,
    /// 410
    Ended,
    /// Any other error status
    RetryLater(u16),
    /// No response reached the client
    RequestFailed,
}

impl ClaimOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => ClaimOutcome::Accepted,
            400 => ClaimOutcome::NotStarted,
            406 => ClaimOutcome::AlreadyEntered,
            410 => ClaimOutcome::Ended,
            other => ClaimOutcome::RetryLater(other),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ClaimOutcome::Accepted)
    }

    pub fn message(&self) -> &'static str {
        match self {
            ClaimOutcome::Accepted => ACCEPTED_MESSAGE,
            ClaimOutcome::NotStarted => "The event has not started yet.",
            ClaimOutcome::AlreadyEntered => {
                "You have already entered this event. Check the leaderboard for the results."
            }
            ClaimOutcome::Ended => "The event has ended.",
            ClaimOutcome::RetryLater(_) => "Please try again in a moment.",
            ClaimOutcome::RequestFailed => "The coupon request failed.",
        }
    }
}

/// What covers the coupon list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Progress,
    Success,
    Failure(ClaimOutcome),
}

/// Coupon list interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimPanel {
    in_flight: bool,
    overlay: Overlay,
}

impl Default for ClaimPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimPanel {
    pub fn new() -> Self {
        Self {
            in_flight: false,
            overlay: Overlay::None,
        }
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn can_apply(&self) -> bool {
        !self.in_flight && self.overlay == Overlay::None
    }

    /// Lock the buttons for a new attempt; `false` when one is not allowed
    pub fn begin(&mut self) -> bool {
        if !self.can_apply() {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish(&mut self, outcome: ClaimOutcome) {
        self.in_flight = false;
        self.overlay = if outcome.is_accepted() {
            Overlay::Progress
        } else {
            Overlay::Failure(outcome)
        };
    }

    /// Progress timer fired
    pub fn progress_elapsed(&mut self) {
        if self.overlay == Overlay::Progress {
            self.overlay = Overlay::Success;
        }
    }

    /// Confirm button on either modal
    pub fn dismiss(&mut self) {
        if matches!(self.overlay, Overlay::Success | Overlay::Failure(_)) {
            self.overlay = Overlay::None;
        }
    }
}
