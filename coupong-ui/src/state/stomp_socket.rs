//! STOMP Chat Socket
//!
//! STOMP 1.2 over the browser `WebSocket`. The handshake, subscriptions and
//! the `/pub/enter` announcement happen once the socket opens; frames are
//! decoded with the shared [`FrameDecoder`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use coupong::chat::message::{
    parse_participant_count, parse_participants, PUB_ENTER, PUB_EXIT, PUB_MESSAGES, SUB_CHAT,
    SUB_TOTAL, SUB_USERS,
};
use coupong::chat::{check_message, ChatMessage, Command, FilterReport, Frame, FrameDecoder};

use crate::api;

const SUBSCRIPTIONS: [(&str, &str); 3] = [
    ("sub-0", SUB_CHAT),
    ("sub-1", SUB_USERS),
    ("sub-2", SUB_TOTAL),
];

/// Room activity for the chat widget
#[derive(Debug, Clone)]
pub enum RoomEvent {
    Joined,
    Message(ChatMessage),
    Participants(u32),
    ParticipantList(Vec<String>),
    Closed,
}

pub struct ChatSocket {
    ws: WebSocket,
    username: String,
    joined: Rc<Cell<bool>>,
}

impl ChatSocket {
    pub fn connect(
        url: &str,
        host: &str,
        username: &str,
        listener: impl Fn(RoomEvent) + 'static,
    ) -> Result<Rc<Self>, String> {
        let ws = WebSocket::new(url).map_err(|e| format!("WebSocket connection failed: {:?}", e))?;
        let socket = Rc::new(Self {
            ws,
            username: username.to_string(),
            joined: Rc::new(Cell::new(false)),
        });
        socket.setup_handlers(host.to_string(), Rc::new(listener));
        Ok(socket)
    }

    fn setup_handlers(&self, host: String, listener: Rc<dyn Fn(RoomEvent)>) {
        let decoder = Rc::new(RefCell::new(FrameDecoder::new()));

        // On open: STOMP handshake
        let ws_clone = self.ws.clone();
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"Chat socket open".into());
            if let Err(e) = ws_clone.send_with_str(&Frame::connect(&host).encode()) {
                web_sys::console::error_1(&format!("CONNECT failed: {:?}", e).into());
            }
        }) as Box<dyn FnMut(JsValue)>);
        self.ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        // On message
        let ws_clone = self.ws.clone();
        let username = self.username.clone();
        let joined = Rc::clone(&self.joined);
        let message_listener = Rc::clone(&listener);
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                return;
            };
            let frames = match decoder.borrow_mut().push(text.as_bytes()) {
                Ok(frames) => frames,
                Err(e) => {
                    web_sys::console::error_1(&format!("Bad STOMP frame: {}", e).into());
                    return;
                }
            };

            for frame in frames {
                match frame.command {
                    Command::Connected => {
                        for (id, destination) in SUBSCRIPTIONS {
                            let _ = ws_clone.send_with_str(&Frame::subscribe(id, destination).encode());
                        }
                        if let Err(e) = publish(&ws_clone, PUB_ENTER, &ChatMessage::presence(&username)) {
                            web_sys::console::error_1(&e.into());
                        }
                        joined.set(true);
                        message_listener(RoomEvent::Joined);
                    }
                    Command::Message => {
                        if let Some(event) = route(&frame) {
                            message_listener(event);
                        }
                    }
                    Command::Error => {
                        web_sys::console::error_1(
                            &format!("Broker error: {}", frame.get("message").unwrap_or(&frame.body)).into(),
                        );
                    }
                    _ => {}
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        self.ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close
        let joined = Rc::clone(&self.joined);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("Chat socket closed: code={}, reason={}", event.code(), event.reason()).into(),
            );
            joined.set(false);
            listener(RoomEvent::Closed);
        }) as Box<dyn FnMut(CloseEvent)>);
        self.ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("Chat socket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        self.ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_joined(&self) -> bool {
        self.joined.get() && self.ws.ready_state() == WebSocket::OPEN
    }

    /// Validate, report and publish a message. Every attempt is reported to
    /// the filtering endpoint; a refusal keeps the message off the room.
    pub async fn send(&self, text: &str) -> Result<(), String> {
        let draft = ChatMessage::new(&self.username, text);

        if let Err(rejection) = check_message(text) {
            if let Err(e) = api::report_filtering(&rejection.report(draft)).await {
                web_sys::console::error_1(&e.into());
            }
            return Err(rejection.to_string());
        }

        match api::report_filtering(&FilterReport::success(draft.clone())).await {
            Ok(true) => {}
            Ok(false) => return Err("Your message contains a forbidden word.".to_string()),
            Err(e) => web_sys::console::warn_1(&format!("{}, sending anyway", e).into()),
        }

        if !self.is_joined() {
            return Err("Not connected to the chat.".to_string());
        }
        publish(&self.ws, PUB_MESSAGES, &draft)
    }

    /// Announce the exit and disconnect
    pub fn exit(&self) {
        if self.is_joined() {
            if let Err(e) = publish(&self.ws, PUB_EXIT, &ChatMessage::presence(&self.username)) {
                web_sys::console::error_1(&e.into());
            }
            let receipt = format!("disconnect-{}", js_sys::Date::now() as u64);
            let _ = self.ws.send_with_str(&Frame::disconnect(&receipt).encode());
        }
        self.joined.set(false);
        let _ = self.ws.close();
    }
}

fn publish(ws: &WebSocket, destination: &str, message: &ChatMessage) -> Result<(), String> {
    let body = serde_json::to_string(message).map_err(|e| e.to_string())?;
    ws.send_with_str(&Frame::send_json(destination, body).encode())
        .map_err(|e| format!("Chat send failed: {:?}", e))
}

fn route(frame: &Frame) -> Option<RoomEvent> {
    let destination = frame.get("destination").or_else(|| {
        let subscription = frame.get("subscription")?;
        SUBSCRIPTIONS
            .iter()
            .find(|(id, _)| *id == subscription)
            .map(|(_, destination)| *destination)
    })?;

    match destination {
        SUB_CHAT => serde_json::from_str(&frame.body).ok().map(RoomEvent::Message),
        SUB_USERS => parse_participant_count(&frame.body).map(RoomEvent::Participants),
        SUB_TOTAL => parse_participants(&frame.body).map(RoomEvent::ParticipantList),
        _ => None,
    }
}
