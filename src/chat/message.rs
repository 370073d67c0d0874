//! Chat room payloads and destinations

use serde::{Deserialize, Serialize};

pub const PUB_MESSAGES: &str = "/pub/messages";
pub const PUB_ENTER: &str = "/pub/enter";
pub const PUB_EXIT: &str = "/pub/exit";
pub const SUB_CHAT: &str = "/sub/chat";
pub const SUB_USERS: &str = "/sub/users";
pub const SUB_TOTAL: &str = "/sub/total";

/// Sender name the server uses for enter/exit notices
pub const NOTICE_WRITER: &str = "알림";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub writer: String,
    #[serde(default)]
    pub message: String,
    /// Stamped by the server; empty on the way out
    #[serde(default)]
    pub created_date: String,
}

impl ChatMessage {
    pub fn new(writer: &str, message: &str) -> Self {
        Self {
            writer: writer.to_string(),
            message: message.to_string(),
            created_date: String::new(),
        }
    }

    /// Body of the enter and exit publications
    pub fn presence(writer: &str) -> Self {
        Self::new(writer, "")
    }

    pub fn kind(&self, me: &str) -> MessageKind {
        if self.writer == me {
            MessageKind::Mine
        } else if self.writer == NOTICE_WRITER {
            MessageKind::Notice
        } else {
            MessageKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Mine,
    Notice,
    Other,
}

impl MessageKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            MessageKind::Mine => "my-message",
            MessageKind::Notice => "notify-message",
            MessageKind::Other => "other-message",
        }
    }
}

/// `/sub/users` bodies carry the participant count as a bare integer
pub fn parse_participant_count(body: &str) -> Option<u32> {
    let digits: String = body
        .trim()
        .trim_matches('"')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// `/sub/total` bodies list participant names as a JSON array
pub fn parse_participants(body: &str) -> Option<Vec<String>> {
    serde_json::from_str(body).ok()
}

/// Outcome reported to the filtering endpoint for each send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub status: FilterStatus,
    pub data: ChatMessage,
    pub message: Option<String>,
}

impl FilterReport {
    pub fn success(data: ChatMessage) -> Self {
        Self {
            status: FilterStatus::Success,
            data,
            message: None,
        }
    }

    pub fn error(data: ChatMessage, message: &str) -> Self {
        Self {
            status: FilterStatus::Error,
            data,
            message: Some(message.to_string()),
        }
    }
}
