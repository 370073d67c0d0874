//! STOMP chat room client
//!
//! Connects over WebSocket, performs the STOMP handshake, subscribes to the
//! room topics and announces the user. A background task then multiplexes
//! outgoing frames and incoming messages with `tokio::select!` and forwards
//! room activity as [`ChatEvent`]s.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::input::{check_message, InputRejection};
use super::message::{
    parse_participant_count, parse_participants, ChatMessage, FilterReport, PUB_ENTER, PUB_EXIT,
    PUB_MESSAGES, SUB_CHAT, SUB_TOTAL, SUB_USERS,
};
use super::stomp::{Command, Frame, FrameDecoder, StompError};
use crate::api::client::CoupongClient;
use crate::api::endpoints::Endpoints;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const SUBSCRIPTIONS: [(&str, &str); 3] = [
    ("sub-0", SUB_CHAT),
    ("sub-1", SUB_USERS),
    ("sub-2", SUB_TOTAL),
];

#[derive(Debug, Clone)]
pub struct ChatRoomConfig {
    /// `ws://` or `wss://` URL of the STOMP endpoint
    pub socket_url: String,
    /// Value of the STOMP `host` header
    pub host: String,
    pub username: String,
    pub connect_timeout: Duration,
    /// How long [`ChatRoom::exit`] waits for the server's receipt
    pub shutdown_timeout: Duration,
}

impl ChatRoomConfig {
    pub fn new(endpoints: &Endpoints, chat_path: &str, username: &str) -> Self {
        Self {
            socket_url: endpoints.chat_socket(chat_path),
            host: endpoints.host().to_string(),
            username: username.to_string(),
            connect_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message(ChatMessage),
    /// `/sub/users`
    Participants(u32),
    /// `/sub/total`
    ParticipantList(Vec<String>),
    /// ERROR frame from the broker
    BrokerError(String),
    /// Last event on the channel; `None` after a clean exit
    Disconnected(Option<String>),
}

pub struct ChatRoom {
    username: String,
    api: Arc<CoupongClient>,
    out_tx: mpsc::UnboundedSender<Frame>,
    task: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl ChatRoom {
    /// Connect, subscribe and announce the user with `/pub/enter`
    pub async fn connect(
        config: ChatRoomConfig,
        api: Arc<CoupongClient>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChatEvent>), ChatError> {
        let (ws, _) = tokio::time::timeout(
            config.connect_timeout,
            tokio_tungstenite::connect_async(config.socket_url.as_str()),
        )
        .await
        .map_err(|_| ChatError::Timeout)?
        .map_err(|e| ChatError::Connect(e.to_string()))?;

        let (mut sink, mut source) = ws.split();
        let mut decoder = FrameDecoder::new();

        write_frame(&mut sink, &Frame::connect(&config.host)).await?;
        let connected = tokio::time::timeout(
            config.connect_timeout,
            await_connected(&mut source, &mut decoder),
        )
        .await
        .map_err(|_| ChatError::Timeout)??;
        info!(
            url = %config.socket_url,
            version = connected.get("version").unwrap_or("?"),
            "chat connected"
        );

        for (id, destination) in SUBSCRIPTIONS {
            write_frame(&mut sink, &Frame::subscribe(id, destination)).await?;
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(sink, source, decoder, out_rx, event_tx));

        let room = Self {
            username: config.username,
            api,
            out_tx,
            task: Some(task),
            shutdown_timeout: config.shutdown_timeout,
        };
        room.publish(PUB_ENTER, &ChatMessage::presence(&room.username))?;
        Ok((room, event_rx))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send a chat message. Every attempt is reported to the filtering
    /// endpoint; a refusal from that endpoint keeps the message off the room.
    pub async fn send(&self, text: &str) -> Result<(), ChatError> {
        let draft = ChatMessage::new(&self.username, text);

        if let Err(rejection) = check_message(text) {
            self.report(&rejection.report(draft)).await;
            return Err(ChatError::Rejected(rejection));
        }

        match self.api.report_filtering(&FilterReport::success(draft.clone())).await {
            Ok(()) => {}
            Err(e) if matches!(e.status(), Some(400..=499)) => {
                warn!(error = %e, "message refused by filtering");
                return Err(ChatError::Forbidden);
            }
            Err(e) => warn!(error = %e, "filtering report failed, sending anyway"),
        }

        self.publish(PUB_MESSAGES, &draft)
    }

    /// Publish `/pub/exit`, disconnect and wait for the pump to finish
    pub async fn exit(mut self) -> Result<(), ChatError> {
        self.publish(PUB_EXIT, &ChatMessage::presence(&self.username))?;
        let receipt = format!("disconnect-{}", uuid::Uuid::new_v4());
        self.out_tx
            .send(Frame::disconnect(&receipt))
            .map_err(|_| ChatError::NotConnected)?;

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("chat pump ended with join error: {e}"),
                Err(_) => {
                    warn!("no DISCONNECT receipt in time, aborting chat pump");
                    task.abort();
                }
            }
        }
        info!(user = %self.username, "left chat");
        Ok(())
    }

    fn publish(&self, destination: &str, message: &ChatMessage) -> Result<(), ChatError> {
        let body = serde_json::to_string(message).map_err(|e| ChatError::Encode(e.to_string()))?;
        self.out_tx
            .send(Frame::send_json(destination, body))
            .map_err(|_| ChatError::NotConnected)
    }

    async fn report(&self, report: &FilterReport) {
        if let Err(e) = self.api.report_filtering(report).await {
            warn!(error = %e, "filtering report failed");
        }
    }
}

impl Drop for ChatRoom {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn write_frame(sink: &mut WsSink, frame: &Frame) -> Result<(), ChatError> {
    sink.send(Message::Text(frame.encode()))
        .await
        .map_err(|e| ChatError::Connect(e.to_string()))
}

async fn await_connected(
    source: &mut WsSource,
    decoder: &mut FrameDecoder,
) -> Result<Frame, ChatError> {
    while let Some(message) = source.next().await {
        let message = message.map_err(|e| ChatError::Connect(e.to_string()))?;
        let Some(bytes) = payload(&message) else {
            continue;
        };
        let frames = match decoder.push(bytes) {
            Ok(frames) => frames,
            Err(e) => {
                debug!(error = %e, "frame before CONNECTED dropped");
                continue;
            }
        };
        for frame in frames {
            match frame.command {
                Command::Connected => return Ok(frame),
                Command::Error => return Err(ChatError::Handshake(broker_error(&frame))),
                other => debug!(command = %other, "frame before CONNECTED ignored"),
            }
        }
    }
    Err(ChatError::Connect("socket closed during handshake".to_string()))
}

fn payload(message: &Message) -> Option<&[u8]> {
    match message {
        Message::Text(text) => Some(text.as_bytes()),
        Message::Binary(bytes) => Some(bytes.as_slice()),
        _ => None,
    }
}

fn broker_error(frame: &Frame) -> String {
    frame
        .get("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.clone())
}

async fn pump(
    mut sink: WsSink,
    mut source: WsSource,
    mut decoder: FrameDecoder,
    mut out_rx: mpsc::UnboundedReceiver<Frame>,
    event_tx: mpsc::UnboundedSender<ChatEvent>,
) {
    let mut pending_receipt: Option<String> = None;

    let reason = loop {
        tokio::select! {
            outgoing = out_rx.recv() => {
                let Some(frame) = outgoing else {
                    let _ = sink.close().await;
                    break Some("chat room dropped".to_string());
                };
                if frame.command == Command::Disconnect {
                    pending_receipt = frame.get("receipt").map(str::to_string);
                }
                if let Err(e) = write_frame(&mut sink, &frame).await {
                    error!(error = %e, "chat send failed");
                    break Some(e.to_string());
                }
            }

            incoming = source.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break Some("closed by server".to_string()),
                };
                if let Message::Close(close) = &message {
                    debug!(?close, "chat socket closing");
                    break pending_receipt.is_none().then(|| "closed by server".to_string());
                }
                let Some(bytes) = payload(&message) else {
                    continue;
                };
                let frames = match decoder.push(bytes) {
                    Ok(frames) => frames,
                    Err(e) => {
                        debug!(error = %e, "nothing decodable in chat payload");
                        continue;
                    }
                };

                let mut receipt_seen = false;
                for frame in frames {
                    if frame.command == Command::Receipt
                        && pending_receipt.is_some()
                        && frame.get("receipt-id") == pending_receipt.as_deref()
                    {
                        receipt_seen = true;
                        continue;
                    }
                    if let Some(event) = to_event(&frame) {
                        if event_tx.send(event).is_err() {
                            debug!("chat event receiver dropped");
                        }
                    }
                }
                if receipt_seen {
                    let _ = sink.close().await;
                    break None;
                }
            }
        }
    };

    if let Some(reason) = &reason {
        warn!(%reason, "chat disconnected");
    }
    let _ = event_tx.send(ChatEvent::Disconnected(reason));
}

fn to_event(frame: &Frame) -> Option<ChatEvent> {
    match frame.command {
        Command::Message => {}
        Command::Error => return Some(ChatEvent::BrokerError(broker_error(frame))),
        other => {
            debug!(command = %other, "unhandled frame");
            return None;
        }
    }

    let destination = frame.get("destination").or_else(|| {
        let subscription = frame.get("subscription")?;
        SUBSCRIPTIONS
            .iter()
            .find(|(id, _)| *id == subscription)
            .map(|(_, destination)| *destination)
    });

    match destination {
        Some(SUB_CHAT) => match serde_json::from_str::<ChatMessage>(&frame.body) {
            Ok(message) => Some(ChatEvent::Message(message)),
            Err(e) => {
                warn!(error = %e, body = %frame.body, "bad chat message");
                None
            }
        },
        Some(SUB_USERS) => parse_participant_count(&frame.body).map(ChatEvent::Participants),
        Some(SUB_TOTAL) => parse_participants(&frame.body).map(ChatEvent::ParticipantList),
        other => {
            debug!(destination = ?other, "message for unknown destination");
            None
        }
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat connection failed: {0}")]
    Connect(String),

    #[error("Chat connection timed out")]
    Timeout,

    #[error("Broker refused the connection: {0}")]
    Handshake(String),

    #[error("STOMP protocol error: {0}")]
    Stomp(#[from] StompError),

    #[error("Message not sent: {0}")]
    Rejected(#[from] InputRejection),

    #[error("Your message contains a forbidden word.")]
    Forbidden,

    #[error("Not connected to the chat room")]
    NotConnected,

    #[error("Failed to encode message: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeServer, BAD_FRAME_TRIGGER};

    async fn next_message(events: &mut mpsc::UnboundedReceiver<ChatEvent>) -> ChatMessage {
        loop {
            match events.recv().await {
                Some(ChatEvent::Message(message)) => return message,
                Some(_) => continue,
                None => panic!("chat closed"),
            }
        }
    }

    async fn join(
        server: &FakeServer,
        username: &str,
    ) -> (ChatRoom, mpsc::UnboundedReceiver<ChatEvent>) {
        let api = Arc::new(
            CoupongClient::new(server.endpoints(), Duration::from_secs(5)).unwrap(),
        );
        let config = ChatRoomConfig::new(&server.endpoints(), "/chat", username);
        ChatRoom::connect(config, api).await.unwrap()
    }

    #[tokio::test]
    async fn test_enter_send_exit() {
        let server = FakeServer::start().await;
        let (room, mut events) = join(&server, "alice").await;

        let notice = next_message(&mut events).await;
        assert_eq!(notice.writer, "알림");
        assert_eq!(notice.message, "alice joined");

        room.send("hello room").await.unwrap();
        let echoed = next_message(&mut events).await;
        assert_eq!(echoed.writer, "alice");
        assert_eq!(echoed.message, "hello room");
        assert!(!echoed.created_date.is_empty());

        room.exit().await.unwrap();
        let mut saw_clean_disconnect = false;
        while let Some(event) = events.recv().await {
            if event == ChatEvent::Disconnected(None) {
                saw_clean_disconnect = true;
            }
        }
        assert!(saw_clean_disconnect);
    }

    #[tokio::test]
    async fn test_participant_updates() {
        let server = FakeServer::start().await;
        let (room, mut events) = join(&server, "bob").await;

        let mut count = None;
        let mut names = None;
        while count.is_none() || names.is_none() {
            match events.recv().await {
                Some(ChatEvent::Participants(n)) => count = Some(n),
                Some(ChatEvent::ParticipantList(list)) => names = Some(list),
                Some(_) => {}
                None => panic!("chat closed"),
            }
        }
        assert_eq!(count, Some(1));
        assert_eq!(names, Some(vec!["bob".to_string()]));
        drop(room);
    }

    #[tokio::test]
    async fn test_rejected_messages_are_reported_not_sent() {
        let server = FakeServer::start().await;
        let (room, _events) = join(&server, "carol").await;

        assert!(matches!(
            room.send("   ").await,
            Err(ChatError::Rejected(InputRejection::Empty))
        ));
        assert!(matches!(
            room.send(&"x".repeat(201)).await,
            Err(ChatError::Rejected(InputRejection::TooLong))
        ));
        assert!(matches!(room.send("badword").await, Err(ChatError::Forbidden)));

        let reports = server.filter_reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0]["message"], "no data chatMessage");
        assert_eq!(reports[1]["message"], "too long chatMessage data");
        assert_eq!(reports[2]["status"], "success");
        assert_eq!(server.published_messages(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_stop_delivery() {
        let server = FakeServer::start().await;
        let (room, mut events) = join(&server, "dave").await;
        next_message(&mut events).await;

        room.send(BAD_FRAME_TRIGGER).await.unwrap();
        assert_eq!(next_message(&mut events).await.message, BAD_FRAME_TRIGGER);

        room.send("still here").await.unwrap();
        assert_eq!(next_message(&mut events).await.message, "still here");
        room.exit().await.unwrap();
    }

    #[tokio::test]
    async fn test_exit_is_clean_with_unread_events() {
        let server = FakeServer::start().await;
        let (room, mut events) = join(&server, "erin").await;

        for i in 0..300 {
            room.send(&format!("message {}", i)).await.unwrap();
        }
        room.exit().await.unwrap();

        let mut messages = 0;
        let mut last = None;
        while let Some(event) = events.recv().await {
            if matches!(event, ChatEvent::Message(_)) {
                messages += 1;
            }
            last = Some(event);
        }
        assert!(messages >= 300);
        assert_eq!(last, Some(ChatEvent::Disconnected(None)));
    }
}
