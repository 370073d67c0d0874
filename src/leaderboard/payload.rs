//! Leaderboard wire payloads
//!
//! Snapshots come back as `{ "<category>": { "<userId>": <entry millis> } }`,
//! stream updates as `{ couponCategory, winners: [userId, ...], entryTime }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One winner row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub user_id: String,
    /// Entry instant in epoch millis, when the server sent one
    pub entry_time: Option<i64>,
}

impl Winner {
    pub fn new(user_id: impl Into<String>, entry_time: Option<i64>) -> Self {
        Self {
            user_id: user_id.into(),
            entry_time,
        }
    }
}

/// Winners of `category` in a snapshot body, earliest entry first.
/// A body without the category yields an empty list.
pub fn parse_snapshot(category: &str, body: &Value) -> Vec<Winner> {
    let Some(entries) = body.get(category).and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut winners: Vec<Winner> = entries
        .iter()
        .map(|(user_id, score)| Winner::new(user_id.clone(), score_millis(score)))
        .collect();

    winners.sort_by(|a, b| {
        let a_key = a.entry_time.unwrap_or(i64::MAX);
        let b_key = b.entry_time.unwrap_or(i64::MAX);
        a_key.cmp(&b_key).then_with(|| a.user_id.cmp(&b.user_id))
    });
    winners
}

/// Sorted-set scores may arrive as floats
fn score_millis(score: &Value) -> Option<i64> {
    score
        .as_i64()
        .or_else(|| score.as_f64().map(|f| f as i64))
        .or_else(|| score.as_str().and_then(|s| s.trim().parse().ok()))
}

/// A stream push for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerUpdate {
    pub coupon_category: String,
    pub winners: Vec<String>,
    #[serde(default)]
    pub entry_time: Option<i64>,
}

impl WinnerUpdate {
    /// Rows for the board; every winner carries the update's entry time
    pub fn rows(&self) -> Vec<Winner> {
        self.winners
            .iter()
            .map(|user_id| Winner::new(user_id.clone(), self.entry_time))
            .collect()
    }
}

/// Decode the `data` of a stream event. Anything unusable is logged and
/// dropped.
pub fn parse_update(data: &str) -> Option<WinnerUpdate> {
    if data.trim().is_empty() {
        tracing::warn!("received an empty leaderboard event");
        return None;
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "failed to parse leaderboard event");
            return None;
        }
    };

    let category = value
        .get("couponCategory")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty());
    let winners = value.get("winners").and_then(Value::as_array);

    let (Some(category), Some(winners)) = (category, winners) else {
        tracing::warn!(payload = %value, "invalid leaderboard event");
        return None;
    };

    Some(WinnerUpdate {
        coupon_category: category.to_string(),
        winners: winners
            .iter()
            .filter_map(|w| match w {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        entry_time: value.get("entryTime").and_then(score_millis),
    })
}
