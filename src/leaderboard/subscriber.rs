//! Leaderboard stream subscriber
//!
//! A background task holds the event stream open and forwards decoded
//! updates over a channel. When the stream drops it waits a fixed delay and
//! reconnects, forever, resuming from the last event id it saw. Dropping the
//! [`StreamHandle`] stops the task.

use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::payload::{parse_update, WinnerUpdate};
use super::sse::EventStreamDecoder;
use crate::api::endpoints::Endpoints;
use crate::api::error::ApiError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The stream is open; clear any error shown
    Opened,
    Update(WinnerUpdate),
    /// The stream failed or ended; a reconnect follows after the delay
    Failed(String),
}

pub struct LeaderboardSubscriber {
    client: Client,
    endpoints: Endpoints,
    reconnect_delay: Duration,
}

impl LeaderboardSubscriber {
    pub fn new(
        endpoints: Endpoints,
        connect_timeout: Duration,
        reconnect_delay: Duration,
    ) -> Result<Self, ApiError> {
        // no overall timeout, the stream is meant to stay open
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            client,
            endpoints,
            reconnect_delay,
        })
    }

    /// Start following `category` (`ALL` for every category)
    #[must_use = "dropping the handle closes the stream"]
    pub fn subscribe(&self, category: &str) -> StreamHandle {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let url = self.endpoints.leaderboard_stream(category);
        let task = tokio::spawn(stream_loop(
            self.client.clone(),
            url,
            self.reconnect_delay,
            tx,
        ));
        StreamHandle {
            rx,
            task: Some(task),
        }
    }
}

pub struct StreamHandle {
    rx: mpsc::Receiver<StreamEvent>,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    pub fn close(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("leaderboard stream closed");
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn stream_loop(
    client: Client,
    url: String,
    reconnect_delay: Duration,
    tx: mpsc::Sender<StreamEvent>,
) {
    let mut last_event_id: Option<String> = None;

    loop {
        let reason = match open(&client, &url, last_event_id.as_deref()).await {
            Ok(response) => {
                info!(%url, "leaderboard stream opened");
                if tx.send(StreamEvent::Opened).await.is_err() {
                    return;
                }

                let mut decoder = EventStreamDecoder::with_last_event_id(last_event_id.take());
                let mut body = response.bytes_stream();
                let reason = loop {
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            for event in decoder.feed(&chunk) {
                                if event.event != "message" {
                                    debug!(event = %event.event, "skipping named event");
                                    continue;
                                }
                                let Some(update) = parse_update(&event.data) else {
                                    continue;
                                };
                                if tx.send(StreamEvent::Update(update)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Err(e)) => break e.to_string(),
                        None => break "stream closed by server".to_string(),
                    }
                };
                last_event_id = decoder.last_event_id().map(str::to_string);
                reason
            }
            Err(e) => e.to_string(),
        };

        warn!(%url, %reason, delay = ?reconnect_delay, "leaderboard stream failed, reconnecting");
        if tx.send(StreamEvent::Failed(reason)).await.is_err() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn open(
    client: &Client,
    url: &str,
    last_event_id: Option<&str>,
) -> Result<reqwest::Response, ApiError> {
    let mut request = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .header(reqwest::header::CACHE_CONTROL, "no-cache");
    if let Some(id) = last_event_id {
        request = request.header("Last-Event-ID", id);
    }

    let response = request.send().await.map_err(ApiError::from_transport)?;
    if !response.status().is_success() {
        return Err(ApiError::Status {
            status: response.status().as_u16(),
            message: "event stream refused".to_string(),
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServer;

    #[tokio::test]
    async fn test_updates_and_reconnect() {
        let server = FakeServer::start().await;
        let subscriber = LeaderboardSubscriber::new(
            server.endpoints(),
            Duration::from_secs(2),
            Duration::from_millis(300),
        )
        .unwrap();
        let mut handle = subscriber.subscribe("PIZZA");

        assert_eq!(handle.next().await, Some(StreamEvent::Opened));
        match handle.next().await {
            Some(StreamEvent::Update(update)) => {
                assert_eq!(update.coupon_category, "PIZZA");
                assert_eq!(update.winners, vec!["early", "late", "newcomer"]);
            }
            other => panic!("expected update, got {:?}", other),
        }
        // garbage event is dropped, the server then ends the response
        assert!(matches!(handle.next().await, Some(StreamEvent::Failed(_))));

        // second connection resumes from the last id
        assert_eq!(handle.next().await, Some(StreamEvent::Opened));
        assert_eq!(
            server.stream_requests(),
            vec![None, Some("1".to_string())]
        );
        handle.close();
    }

    #[tokio::test]
    async fn test_unreachable_server_keeps_retrying() {
        let subscriber = LeaderboardSubscriber::new(
            Endpoints::new("http://127.0.0.1:9"),
            Duration::from_millis(500),
            Duration::from_millis(10),
        )
        .unwrap();
        let mut handle = subscriber.subscribe("ALL");

        for _ in 0..3 {
            assert!(matches!(handle.next().await, Some(StreamEvent::Failed(_))));
        }
    }
}
