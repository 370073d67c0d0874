//! Leaderboard Event Stream
//!
//! Wraps the browser `EventSource`. The browser retries on its own while the
//! stream is still `CONNECTING`; once it reports `CLOSED` a new source is
//! opened after a fixed delay, with no cap on attempts.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent};

use coupong::leaderboard::{parse_update, WinnerUpdate, RECONNECT_DELAY};

/// What the stream reports to the leaderboard widget
#[derive(Debug, Clone)]
pub enum StreamSignal {
    Opened,
    Update(WinnerUpdate),
    Failed,
}

type Listener = Rc<dyn Fn(StreamSignal)>;

pub struct LeaderboardStream {
    source: Rc<RefCell<Option<EventSource>>>,
    closed: Rc<Cell<bool>>,
}

impl LeaderboardStream {
    pub fn open(url: &str, listener: impl Fn(StreamSignal) + 'static) -> Self {
        let stream = Self {
            source: Rc::new(RefCell::new(None)),
            closed: Rc::new(Cell::new(false)),
        };
        connect(
            url.to_string(),
            Rc::new(listener),
            Rc::clone(&stream.source),
            Rc::clone(&stream.closed),
        );
        stream
    }

    /// Stop the stream; a pending reconnect sees the flag and gives up
    pub fn close(&self) {
        self.closed.set(true);
        if let Some(source) = self.source.borrow_mut().take() {
            source.close();
        }
    }
}

impl Drop for LeaderboardStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn connect(
    url: String,
    listener: Listener,
    slot: Rc<RefCell<Option<EventSource>>>,
    closed: Rc<Cell<bool>>,
) {
    if closed.get() {
        return;
    }

    let source = match EventSource::new(&url) {
        Ok(source) => source,
        Err(e) => {
            web_sys::console::error_1(&format!("EventSource failed: {:?}", e).into());
            listener(StreamSignal::Failed);
            schedule(url, listener, slot, closed);
            return;
        }
    };

    // On open
    let on_open_listener = Rc::clone(&listener);
    let on_open = Closure::wrap(Box::new(move |_: JsValue| {
        web_sys::console::log_1(&"Leaderboard stream connected".into());
        on_open_listener(StreamSignal::Opened);
    }) as Box<dyn FnMut(JsValue)>);
    source.set_onopen(Some(on_open.as_ref().unchecked_ref()));
    on_open.forget();

    // On message
    let on_message_listener = Rc::clone(&listener);
    let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
        let Some(data) = event.data().as_string() else {
            return;
        };
        if let Some(update) = parse_update(&data) {
            on_message_listener(StreamSignal::Update(update));
        } else {
            web_sys::console::warn_1(&format!("Ignored leaderboard event: {}", data).into());
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();

    // On error
    let error_url = url.clone();
    let error_slot = Rc::clone(&slot);
    let error_closed = Rc::clone(&closed);
    let error_listener = Rc::clone(&listener);
    let on_error = Closure::wrap(Box::new(move |_: JsValue| {
        web_sys::console::error_1(&"Leaderboard stream error".into());
        error_listener(StreamSignal::Failed);

        let gone = error_slot
            .borrow()
            .as_ref()
            .map(|s| s.ready_state() == EventSource::CLOSED)
            .unwrap_or(true);
        if gone {
            schedule(
                error_url.clone(),
                Rc::clone(&error_listener),
                Rc::clone(&error_slot),
                Rc::clone(&error_closed),
            );
        }
    }) as Box<dyn FnMut(JsValue)>);
    source.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_error.forget();

    *slot.borrow_mut() = Some(source);
}

fn schedule(
    url: String,
    listener: Listener,
    slot: Rc<RefCell<Option<EventSource>>>,
    closed: Rc<Cell<bool>>,
) {
    if closed.get() {
        return;
    }
    if let Some(source) = slot.borrow_mut().take() {
        source.close();
    }

    let delay = RECONNECT_DELAY.as_millis() as u32;
    gloo_timers::callback::Timeout::new(delay, move || {
        web_sys::console::log_1(&"Reopening leaderboard stream".into());
        connect(url, listener, slot, closed);
    })
    .forget();
}
