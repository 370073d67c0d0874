//! Chat room over STOMP
//!
//! The codec, payloads and composer state are platform independent. The
//! tokio room client lives in [`room`] behind the `native` feature.

pub mod input;
pub mod message;
#[cfg(feature = "native")]
pub mod room;
pub mod stomp;

pub use input::{check_message, ChatInput, InputRejection, KeyAction, KeyPress, MAX_MESSAGE_CHARS};
pub use message::{ChatMessage, FilterReport, FilterStatus, MessageKind, NOTICE_WRITER};
#[cfg(feature = "native")]
pub use room::{ChatError, ChatEvent, ChatRoom, ChatRoomConfig};
pub use stomp::{Command, Frame, FrameDecoder, StompError};
