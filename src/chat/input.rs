//! Chat composer state

use thiserror::Error;

use super::message::{ChatMessage, FilterReport};

pub const MAX_MESSAGE_CHARS: usize = 200;

/// Key press in the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    pub shift: bool,
    /// An IME composition is in progress
    pub composing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    InsertNewline,
    /// Let the textarea handle it
    Default,
}

impl KeyPress<'_> {
    pub fn action(&self) -> KeyAction {
        if self.key != "Enter" {
            return KeyAction::Default;
        }
        if self.shift {
            KeyAction::InsertNewline
        } else if self.composing {
            KeyAction::Default
        } else {
            KeyAction::Submit
        }
    }
}

/// Why a message was not sent; the text is what the filtering endpoint records
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    #[error("no data chatMessage")]
    Empty,
    #[error("too long chatMessage data")]
    TooLong,
}

impl InputRejection {
    pub fn report(&self, data: ChatMessage) -> FilterReport {
        FilterReport::error(data, &self.to_string())
    }
}

pub fn check_message(text: &str) -> Result<(), InputRejection> {
    if text.trim().is_empty() {
        Err(InputRejection::Empty)
    } else if text.chars().count() > MAX_MESSAGE_CHARS {
        Err(InputRejection::TooLong)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatInput {
    text: String,
}

impl ChatInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the draft; edits past the limit are refused
    pub fn set_text(&mut self, value: &str) -> bool {
        if value.chars().count() > MAX_MESSAGE_CHARS {
            return false;
        }
        self.text = value.to_string();
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        let next = format!("{}\n", self.text);
        self.set_text(&next)
    }

    /// `n/200`
    pub fn counter(&self) -> String {
        format!("{}/{}", self.len(), MAX_MESSAGE_CHARS)
    }

    /// Hand out the draft for sending and clear it. A refused draft stays put.
    pub fn take_message(&mut self) -> Result<String, InputRejection> {
        check_message(&self.text)?;
        Ok(std::mem::take(&mut self.text))
    }

    /// Clear the draft after `sent` went out, unless it was edited meanwhile
    pub fn clear_sent(&mut self, sent: &str) -> bool {
        if self.text != sent {
            return false;
        }
        self.text.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_actions() {
        let enter = KeyPress { key: "Enter", shift: false, composing: false };
        assert_eq!(enter.action(), KeyAction::Submit);

        let shift_enter = KeyPress { shift: true, ..enter };
        assert_eq!(shift_enter.action(), KeyAction::InsertNewline);

        let composing = KeyPress { composing: true, ..enter };
        assert_eq!(composing.action(), KeyAction::Default);

        let letter = KeyPress { key: "a", ..enter };
        assert_eq!(letter.action(), KeyAction::Default);
    }

    #[test]
    fn test_length_limit() {
        let mut input = ChatInput::new();
        assert!(input.set_text(&"가".repeat(MAX_MESSAGE_CHARS)));
        assert_eq!(input.counter(), "200/200");

        assert!(!input.set_text(&"a".repeat(MAX_MESSAGE_CHARS + 1)));
        assert_eq!(input.len(), MAX_MESSAGE_CHARS);
        assert!(!input.insert_newline());

        assert_eq!(
            check_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)),
            Err(InputRejection::TooLong)
        );
    }

    #[test]
    fn test_take_message() {
        let mut input = ChatInput::new();
        input.set_text("  \n ");
        assert_eq!(input.take_message(), Err(InputRejection::Empty));
        assert_eq!(input.text(), "  \n ");

        input.set_text("hello");
        input.insert_newline();
        assert_eq!(input.take_message().unwrap(), "hello\n");
        assert!(input.is_empty());
        assert_eq!(input.counter(), "0/200");
    }

    #[test]
    fn test_clear_sent_keeps_newer_draft() {
        let mut input = ChatInput::new();
        input.set_text("first");
        assert!(input.clear_sent("first"));
        assert!(input.is_empty());

        input.set_text("first and more");
        assert!(!input.clear_sent("first"));
        assert_eq!(input.text(), "first and more");
    }

    #[test]
    fn test_rejection_report() {
        let report = InputRejection::TooLong.report(ChatMessage::new("alice", "x"));
        assert_eq!(report.message.as_deref(), Some("too long chatMessage data"));
    }
}
