//! Incremental `text/event-stream` decoder
//!
//! Bytes go in as they arrive off the wire, complete events come out. Lines
//! may end in CR, LF or CRLF, and a CRLF split across two chunks is handled.

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type, `message` unless the server named one
    pub event: String,
    pub data: String,
    /// Last event id seen on the stream at dispatch time
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    /// Previous chunk ended in CR; a leading LF belongs to that line
    skip_lf: bool,
    bom_checked: bool,
    event_type: String,
    data: String,
    last_event_id: Option<String>,
    retry: Option<u64>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a stream that was interrupted; the id is sent back as `Last-Event-ID`
    pub fn with_last_event_id(last_event_id: Option<String>) -> Self {
        Self {
            last_event_id,
            ..Self::default()
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection time the server asked for, in milliseconds
    pub fn retry(&self) -> Option<u64> {
        self.retry
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        if !self.bom_checked {
            if self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
                return Vec::new();
            }
            if self.buffer.starts_with(BOM) {
                self.buffer.drain(..BOM.len());
            }
            self.bom_checked = true;
        }

        let mut events = Vec::new();
        let mut cursor = 0;

        loop {
            if self.skip_lf && cursor < self.buffer.len() {
                if self.buffer[cursor] == b'\n' {
                    cursor += 1;
                }
                self.skip_lf = false;
            }

            let rest = &self.buffer[cursor..];
            let Some(end) = rest.iter().position(|&b| b == b'\r' || b == b'\n') else {
                break;
            };

            let line = String::from_utf8_lossy(&rest[..end]).into_owned();
            if rest[end] == b'\r' {
                self.skip_lf = true;
            }
            cursor += end + 1;

            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        self.buffer.drain(..cursor);
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry = Some(ms);
                }
            }
            other => tracing::trace!(field = other, "ignoring unknown event-stream field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }

        Some(SseEvent {
            event: if event_type.is_empty() {
                "message".to_string()
            } else {
                event_type
            },
            data,
            id: self.last_event_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"data: {\"couponCategory\":\"PIZZA\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "{\"couponCategory\":\"PIZZA\"}");
        assert_eq!(events[0].id, None);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.feed(b"id: 7\r").is_empty());
        assert!(decoder.feed(b"\nevent: winners\r\ndata: a").is_empty());
        assert!(decoder.feed(b"bc\r\ndata: def\r").is_empty());

        let events = decoder.feed(b"\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "winners");
        assert_eq!(events[0].data, "abc\ndef");
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(decoder.last_event_id(), Some("7"));
    }

    #[test]
    fn test_comments_bom_and_retry() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.feed(b"\xEF\xBB").is_empty());
        let events = decoder.feed(b"\xBF: keep-alive\n\nretry: 3000\ndata\n\n");
        assert_eq!(decoder.retry(), Some(3000));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "");
    }

    #[test]
    fn test_blank_lines_without_data_dispatch_nothing() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.feed(b"\n\n\r\n").is_empty());
        assert!(decoder.feed(b"event: ping\n\n").is_empty());

        // event type does not leak into the next event
        let events = decoder.feed(b"data: x\n\n");
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn test_resumed_stream_keeps_id() {
        let mut decoder = EventStreamDecoder::with_last_event_id(Some("41".to_string()));
        let events = decoder.feed(b"data: 1\n\n");
        assert_eq!(events[0].id.as_deref(), Some("41"));
    }
}
