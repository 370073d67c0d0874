//! STOMP 1.2 frame codec
//!
//! Frames travel as WebSocket text messages. The decoder is incremental all
//! the same, so it also works over a raw byte stream.

use std::fmt;
use thiserror::Error;

pub const ACCEPT_VERSION: &str = "1.2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StompError> {
        Ok(match s {
            "CONNECT" => Command::Connect,
            "STOMP" => Command::Stomp,
            "CONNECTED" => Command::Connected,
            "SEND" => Command::Send,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            "DISCONNECT" => Command::Disconnect,
            other => return Err(StompError::InvalidCommand(other.to_string())),
        })
    }

    /// Header values of the connect frames are sent verbatim
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header; repeated headers keep the first occurrence
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn connect(host: &str) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
    }

    pub fn send_json(destination: &str, body: impl Into<String>) -> Self {
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .body(body)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new(Command::Disconnect).header("receipt", receipt)
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');

        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }

        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(out)
}

/// Accumulates bytes and yields complete frames
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and decode every complete frame.
    ///
    /// A malformed frame is discarded through its NUL terminator and decoding
    /// carries on with the rest of the buffer. The error is returned only when
    /// nothing else decoded in the same push.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>, StompError> {
        self.buffer.extend_from_slice(data);
        let mut frames = Vec::new();
        let mut first_error = None;

        loop {
            // heart-beats
            let eols = self
                .buffer
                .iter()
                .take_while(|&&b| b == b'\n' || b == b'\r')
                .count();
            self.buffer.drain(..eols);

            if self.buffer.is_empty() {
                break;
            }
            match self.try_frame() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed STOMP frame");
                    self.discard_frame();
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if frames.is_empty() => Err(e),
            _ => Ok(frames),
        }
    }

    /// Drop the frame at the head of the buffer
    fn discard_frame(&mut self) {
        match self.buffer.iter().position(|&b| b == 0) {
            Some(nul) => {
                self.buffer.drain(..=nul);
            }
            None => self.buffer.clear(),
        }
    }

    fn try_frame(&mut self) -> Result<Option<Frame>, StompError> {
        let Some((head_end, body_start)) = find_blank_line(&self.buffer) else {
            return Ok(None);
        };

        let head = std::str::from_utf8(&self.buffer[..head_end]).map_err(|_| StompError::Utf8)?;
        let mut lines = head.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let command = Command::parse(lines.next().unwrap_or_default())?;

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
            if command.escapes_headers() {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .map(|(_, value)| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| StompError::InvalidContentLength(value.clone()))
            })
            .transpose()?;

        let body_end = match content_length {
            Some(len) => {
                let body_end = body_start
                    .checked_add(len)
                    .filter(|end| end.checked_add(1).is_some())
                    .ok_or_else(|| StompError::InvalidContentLength(len.to_string()))?;
                if self.buffer.len() <= body_end {
                    return Ok(None);
                }
                if self.buffer[body_end] != 0 {
                    return Err(StompError::MissingNul);
                }
                body_end
            }
            None => match self.buffer[body_start..].iter().position(|&b| b == 0) {
                Some(offset) => body_start + offset,
                None => return Ok(None),
            },
        };

        let body = String::from_utf8(self.buffer[body_start..body_end].to_vec())
            .map_err(|_| StompError::Utf8)?;
        self.buffer.drain(..=body_end);

        Ok(Some(Frame {
            command,
            headers,
            body,
        }))
    }
}

/// End of the header block and start of the body
fn find_blank_line(buf: &[u8]) -> Option<(usize, usize)> {
    for (i, &b) in buf.iter().enumerate() {
        if b != b'\n' {
            continue;
        }
        match buf.get(i + 1) {
            Some(b'\n') => return Some((i, i + 2)),
            Some(b'\r') if buf.get(i + 2) == Some(&b'\n') => return Some((i, i + 3)),
            _ => {}
        }
    }
    None
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StompError {
    #[error("Unknown STOMP command: {0}")]
    InvalidCommand(String),

    #[error("Malformed header line: {0}")]
    MalformedHeader(String),

    #[error("Invalid escape sequence in header: {0}")]
    InvalidEscape(String),

    #[error("Invalid content-length: {0}")]
    InvalidContentLength(String),

    #[error("Frame body is not NUL terminated")]
    MissingNul,

    #[error("Frame is not valid UTF-8")]
    Utf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_send() {
        let frame = Frame::send_json("/pub/messages", r#"{"writer":"a"}"#);
        assert_eq!(
            frame.encode(),
            "SEND\ndestination:/pub/messages\ncontent-type:application/json\ncontent-length:14\n\n{\"writer\":\"a\"}\0"
        );
    }

    #[test]
    fn test_connect_headers_are_not_escaped() {
        let frame = Frame::connect("localhost").header("passcode", "a:b");
        let encoded = frame.encode();
        assert!(encoded.starts_with("CONNECT\naccept-version:1.2\nhost:localhost\n"));
        assert!(encoded.contains("passcode:a:b\n"));
        assert!(encoded.ends_with("\n\n\0"));
    }

    #[test]
    fn test_header_escaping() {
        let frame = Frame::new(Command::Send).header("note", "a:b\\c\nd");
        assert!(frame.encode().contains("note:a\\cb\\\\c\\nd\n"));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(frame.encode().as_bytes()).unwrap();
        assert_eq!(frames[0].get("note"), Some("a:b\\c\nd"));
    }

    #[test]
    fn test_decode_message_with_heartbeats() {
        let raw = "\n\nMESSAGE\r\ndestination:/sub/users\r\nsubscription:sub-1\r\nmessage-id:1\r\n\r\n3\0\n";
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(raw.as_bytes()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Message);
        assert_eq!(frames[0].get("destination"), Some("/sub/users"));
        assert_eq!(frames[0].body, "3");
    }

    #[test]
    fn test_decode_partial_and_content_length() {
        let body = "a\0b";
        let raw = format!("MESSAGE\ncontent-length:{}\n\n{}\0CONNECTED\nversion:1.2\n\n\0", body.len(), body);
        let bytes = raw.as_bytes();

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&bytes[..12]).unwrap().is_empty());
        let frames = decoder.push(&bytes[12..]).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].body, "a\0b");
        assert_eq!(frames[1].command, Command::Connected);
        assert_eq!(frames[1].get("version"), Some("1.2"));
    }

    #[test]
    fn test_repeated_header_keeps_first() {
        let raw = "MESSAGE\nfoo:first\nfoo:second\n\n\0";
        let frames = FrameDecoder::new().push(raw.as_bytes()).unwrap();
        assert_eq!(frames[0].get("foo"), Some("first"));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            FrameDecoder::new().push(b"HELLO\n\n\0"),
            Err(StompError::InvalidCommand("HELLO".to_string()))
        );
        assert_eq!(
            FrameDecoder::new().push(b"MESSAGE\ncontent-length:1\n\nab\0"),
            Err(StompError::MissingNul)
        );
        assert!(matches!(
            FrameDecoder::new().push(b"MESSAGE\nbad\\x:1\n\n\0"),
            Err(StompError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_bad_frame_does_not_block_later_frames() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder.push(b"HELLO\n\n\0"),
            Err(StompError::InvalidCommand("HELLO".to_string()))
        );

        let frames = decoder.push(b"MESSAGE\ndestination:/sub/chat\n\n{}\0").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].get("destination"), Some("/sub/chat"));
        assert_eq!(frames[0].body, "{}");
    }

    #[test]
    fn test_bad_frame_between_good_ones() {
        let raw = b"MESSAGE\nmessage-id:1\n\na\0HELLO\n\n\0MESSAGE\nmessage-id:2\n\nb\0";
        let frames = FrameDecoder::new().push(raw).unwrap();
        let bodies: Vec<_> = frames.iter().map(|f| f.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b"]);
    }

    #[test]
    fn test_split_frame_after_error() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"MESSAGE\nbroken header\n\n\0").is_err());
        assert!(decoder.push(b"MESSAGE\ndestination:/sub/us").unwrap().is_empty());
        let frames = decoder.push(b"ers\n\n2\0").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].get("destination"), Some("/sub/users"));
        assert_eq!(frames[0].body, "2");
    }

    #[test]
    fn test_huge_content_length_is_rejected() {
        let mut decoder = FrameDecoder::new();
        let raw = format!("MESSAGE\ncontent-length:{}\n\n\0", usize::MAX);
        assert!(matches!(
            decoder.push(raw.as_bytes()),
            Err(StompError::InvalidContentLength(_))
        ));
        let frames = decoder.push(b"RECEIPT\nreceipt-id:bye\n\n\0").unwrap();
        assert_eq!(frames[0].command, Command::Receipt);
    }
}
