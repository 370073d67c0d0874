//! Coupon event listing
//!
//! The listing endpoint answers with an array, a single object, or nothing at
//! all when no drop is running. All three collapse into [`EventListing`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown while the listing request is outstanding
pub const LOADING_MESSAGE: &str = "Loading coupon events...";

/// Shown when the server reports no running event
pub const NO_EVENTS_MESSAGE: &str = "No events are in progress.";

/// Shown when the server returned an empty list
pub const EMPTY_LIST_MESSAGE: &str = "No coupon events available.";

/// Shown when the listing request failed
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch coupon event list";

/// A coupon drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponEvent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub start_time: Option<EventTime>,
}

/// Event start as sent by the server: epoch millis or a date-time string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Millis(i64),
    Text(String),
}

impl EventTime {
    /// `YYYY-MM-DD HH:MM:SS`, or the raw text when it cannot be read
    pub fn display(&self) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
        match self {
            EventTime::Millis(ms) => DateTime::from_timestamp_millis(*ms)
                .map(|dt| dt.format(FORMAT).to_string())
                .unwrap_or_else(|| ms.to_string()),
            EventTime::Text(text) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    dt.format(FORMAT).to_string()
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
                    dt.format(FORMAT).to_string()
                } else {
                    text.clone()
                }
            }
        }
    }
}

impl CouponEvent {
    pub fn logo(&self) -> Logo {
        Logo::for_category(&self.event_category).unwrap_or(Logo::Banapresso)
    }

    pub fn start_display(&self) -> Option<String> {
        self.start_time.as_ref().map(EventTime::display)
    }
}

/// Normalized listing
#[derive(Debug, Clone, PartialEq)]
pub enum EventListing {
    Events(Vec<CouponEvent>),
    NoEvents,
}

impl EventListing {
    /// Collapse the listing body into a list
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => Ok(EventListing::Events(serde_json::from_value(value)?)),
            Value::Object(_) => Ok(EventListing::Events(vec![serde_json::from_value(value)?])),
            _ => Ok(EventListing::NoEvents),
        }
    }

    pub fn events(&self) -> &[CouponEvent] {
        match self {
            EventListing::Events(events) => events,
            EventListing::NoEvents => &[],
        }
    }

    /// Placeholder text when there is nothing to list
    pub fn empty_message(&self) -> Option<&'static str> {
        match self {
            EventListing::NoEvents => Some(NO_EVENTS_MESSAGE),
            EventListing::Events(events) if events.is_empty() => Some(EMPTY_LIST_MESSAGE),
            EventListing::Events(_) => None,
        }
    }
}

/// Brand artwork per coupon category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logo {
    Banapresso,
    DominosPizza,
    BhcChicken,
    BurgerKing,
}

impl Logo {
    pub fn for_category(category: &str) -> Option<Logo> {
        match category {
            "COFFEE" => Some(Logo::Banapresso),
            "PIZZA" => Some(Logo::DominosPizza),
            "CHICKEN" => Some(Logo::BhcChicken),
            "HAMBURGER" => Some(Logo::BurgerKing),
            _ => None,
        }
    }

    pub fn asset_path(&self) -> &'static str {
        match self {
            Logo::Banapresso => "/assets/logos/banapresso.png",
            Logo::DominosPizza => "/assets/logos/dominosPizza.jpg",
            Logo::BhcChicken => "/assets/logos/bhcChicken.jpeg",
            Logo::BurgerKing => "/assets/logos/burgerKing.png",
        }
    }

    pub fn brand(&self) -> &'static str {
        match self {
            Logo::Banapresso => "Banapresso",
            Logo::DominosPizza => "Domino's Pizza",
            Logo::BhcChicken => "bhc Chicken",
            Logo::BurgerKing => "Burger King",
        }
    }
}
