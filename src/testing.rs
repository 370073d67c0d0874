//! In-process coupon server for client tests
//!
//! Serves canned REST replies, a finite leaderboard event stream and a
//! single-connection STOMP broker on a random local port.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::api::endpoints::Endpoints;
use crate::chat::message::{ChatMessage, NOTICE_WRITER, SUB_CHAT, SUB_TOTAL, SUB_USERS};
use crate::chat::stomp::{Command, Frame, FrameDecoder};

const PASSWORD: &str = "secret123";
const CERTIFICATION: &str = "1234";

/// Chat text that makes the broker emit an unparseable frame before the echo
pub const BAD_FRAME_TRIGGER: &str = "send me junk";

#[derive(Default)]
struct FakeState {
    claimed: Mutex<HashSet<String>>,
    filter_reports: Mutex<Vec<Value>>,
    stream_requests: Mutex<Vec<Option<String>>>,
    published: Mutex<Vec<String>>,
}

pub struct FakeServer {
    addr: SocketAddr,
    state: Arc<FakeState>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let api = Router::new()
            .route("/auth/idCheck", post(id_check))
            .route("/mail/sendMail", post(send_mail))
            .route("/mail/checkCertification", post(check_certification))
            .route("/auth/signUp", post(sign_up))
            .route("/auth/signIn", post(sign_in))
            .route("/auth/tokenDecryption", get(token_decryption))
            .route("/coupons", get(coupons))
            .route("/coupon-event/attempt", post(attempt))
            .route("/filtering", post(filtering));

        let app = Router::new()
            .nest("/api/v1", api)
            .route("/api/categories", get(categories))
            .route("/sse/leaderboard", get(snapshot))
            .route("/sse/leaderboard/stream", get(stream))
            .route("/chat", get(chat))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&format!("http://{}", self.addr))
    }

    /// Signs in with a lifetime past the end of the calendar
    pub const ENDLESS_TOKEN_USER: &'static str = "endless";
    /// Signs in with a negative lifetime
    pub const EXPIRED_TOKEN_USER: &'static str = "expired";

    pub fn token_for(user: &str) -> String {
        format!("Bearer token-{}", user)
    }

    pub fn filter_reports(&self) -> Vec<Value> {
        self.state.filter_reports.lock().unwrap().clone()
    }

    /// `Last-Event-ID` of every stream request, in order
    pub fn stream_requests(&self) -> Vec<Option<String>> {
        self.state.stream_requests.lock().unwrap().clone()
    }

    /// Bodies published to `/pub/messages`
    pub fn published_messages(&self) -> Vec<String> {
        self.state.published.lock().unwrap().clone()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn envelope(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({"code": code, "message": code}))).into_response()
}

fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}

async fn id_check(Json(body): Json<Value>) -> Response {
    match field(&body, "id") {
        "" => envelope(StatusCode::BAD_REQUEST, "VALIDATION_FAIL"),
        "taken" => envelope(StatusCode::BAD_REQUEST, "DUPLICATE_ID"),
        _ => envelope(StatusCode::OK, "SUCCESS"),
    }
}

async fn send_mail(Json(body): Json<Value>) -> Response {
    if field(&body, "email").ends_with("@bounce.test") {
        envelope(StatusCode::INTERNAL_SERVER_ERROR, "MAIL_FAIL")
    } else {
        envelope(StatusCode::OK, "SUCCESS")
    }
}

async fn check_certification(Json(body): Json<Value>) -> Response {
    if field(&body, "certification") == CERTIFICATION {
        envelope(StatusCode::OK, "SUCCESS")
    } else {
        envelope(StatusCode::UNAUTHORIZED, "CERTIFICATION_FAIL")
    }
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    if field(&body, "certification") != CERTIFICATION {
        return envelope(StatusCode::UNAUTHORIZED, "CERTIFICATION_FAIL");
    }
    envelope(StatusCode::OK, "SUCCESS")
}

async fn sign_in(Json(body): Json<Value>) -> Response {
    let id = field(&body, "id");
    if field(&body, "password") != PASSWORD {
        return envelope(StatusCode::UNAUTHORIZED, "SIGN_IN_FAIL");
    }
    let lifetime: i64 = match id {
        FakeServer::ENDLESS_TOKEN_USER => 1_000_000_000_000_000,
        FakeServer::EXPIRED_TOKEN_USER => -60,
        _ => 3600,
    };
    Json(json!({
        "code": "SUCCESS",
        "message": "Success.",
        "token": FakeServer::token_for(id),
        "expirationTime": lifetime
    }))
    .into_response()
}

fn user_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer token-")
        .map(str::to_string)
}

async fn token_decryption(headers: HeaderMap) -> Response {
    let Some(user) = user_from(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let role = if user == "root" { "ROLE_ADMIN" } else { "ROLE_USER" };
    Json(json!({
        "username": user,
        "email": format!("{}@example.com", user),
        "type": "app",
        "role": role
    }))
    .into_response()
}

async fn coupons() -> Json<Value> {
    Json(json!([
        {"id": 1, "eventName": "Pizza Friday", "eventCategory": "PIZZA", "startTime": 1728000000000_i64},
        {"id": 2, "eventName": "Morning Coffee", "eventCategory": "COFFEE", "startTime": "2024-10-04T09:00:00"}
    ]))
}

async fn attempt(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let Some(user) = user_from(&headers) else {
        return StatusCode::UNAUTHORIZED;
    };
    match field(&body, "couponCategory") {
        "CHICKEN" => StatusCode::BAD_REQUEST,
        "HAMBURGER" => StatusCode::GONE,
        "PIZZA" => {
            let key = format!("PIZZA:{}", user);
            if state.claimed.lock().unwrap().insert(key) {
                StatusCode::OK
            } else {
                StatusCode::NOT_ACCEPTABLE
            }
        }
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn filtering(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> StatusCode {
    let forbidden = body["data"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("badword"));
    state.filter_reports.lock().unwrap().push(body);
    if forbidden {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    }
}

async fn categories() -> Json<Value> {
    Json(json!(["PIZZA", "COFFEE"]))
}

async fn snapshot(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let category = params.get("couponCategory").cloned().unwrap_or_default();
    if category == "PIZZA" {
        Json(json!({"PIZZA": {"late": 1728000002000_i64, "early": 1728000000000_i64}}))
    } else {
        Json(json!({}))
    }
}

async fn stream(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let last_event_id = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.stream_requests.lock().unwrap().push(last_event_id);

    let category = params.get("couponCategory").cloned().unwrap_or_default();
    let update = json!({
        "couponCategory": category,
        "winners": ["early", "late", "newcomer"],
        "entryTime": 1728000003000_i64
    });
    let body = format!(": connected\n\nid: 1\ndata: {}\n\ndata: garbage\n\n", update);
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn chat(State(state): State<Arc<FakeState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| broker(socket, state))
}

/// Single-connection broker: every publication is echoed to this client
async fn broker(mut socket: WebSocket, state: Arc<FakeState>) {
    let mut decoder = FrameDecoder::new();
    let mut subscriptions: HashMap<String, String> = HashMap::new();

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frames) = decoder.push(text.as_bytes()) else {
            return;
        };

        for frame in frames {
            let mut replies = Vec::new();
            match frame.command {
                Command::Connect | Command::Stomp => {
                    replies.push(Frame::new(Command::Connected).header("version", "1.2"));
                }
                Command::Subscribe => {
                    if let (Some(id), Some(dest)) = (frame.get("id"), frame.get("destination")) {
                        subscriptions.insert(dest.to_string(), id.to_string());
                    }
                }
                Command::Send => {
                    let Ok(msg) = serde_json::from_str::<ChatMessage>(&frame.body) else {
                        continue;
                    };
                    match frame.get("destination") {
                        Some("/pub/enter") => {
                            let notice = ChatMessage::new(NOTICE_WRITER, &format!("{} joined", msg.writer));
                            replies.extend(deliver(&subscriptions, SUB_CHAT, &json!(notice).to_string()));
                            replies.extend(deliver(&subscriptions, SUB_USERS, "1"));
                            replies.extend(deliver(&subscriptions, SUB_TOTAL, &json!([msg.writer]).to_string()));
                        }
                        Some("/pub/exit") => {
                            let notice = ChatMessage::new(NOTICE_WRITER, &format!("{} left", msg.writer));
                            replies.extend(deliver(&subscriptions, SUB_CHAT, &json!(notice).to_string()));
                        }
                        Some("/pub/messages") => {
                            state.published.lock().unwrap().push(frame.body.clone());
                            if msg.message == BAD_FRAME_TRIGGER
                                && socket.send(Message::Text("HELLO\n\n\0".to_string())).await.is_err()
                            {
                                return;
                            }
                            let stamped = ChatMessage {
                                created_date: "12:00".to_string(),
                                ..msg
                            };
                            replies.extend(deliver(&subscriptions, SUB_CHAT, &json!(stamped).to_string()));
                        }
                        _ => {}
                    }
                }
                Command::Disconnect => {
                    if let Some(receipt) = frame.get("receipt") {
                        let receipt = Frame::new(Command::Receipt).header("receipt-id", receipt);
                        let _ = socket.send(Message::Text(receipt.encode())).await;
                    }
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                }
                _ => {}
            }

            for reply in replies {
                if socket.send(Message::Text(reply.encode())).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn deliver(subscriptions: &HashMap<String, String>, destination: &str, body: &str) -> Option<Frame> {
    let id = subscriptions.get(destination)?;
    Some(
        Frame::new(Command::Message)
            .header("destination", destination)
            .header("subscription", id.as_str())
            .header("message-id", uuid::Uuid::new_v4().to_string())
            .body(body),
    )
}
