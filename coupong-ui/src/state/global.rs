//! Global Application State
//!
//! Reactive state shared across routes. The only datum the widgets share is
//! the signed-in username; the rest drives toasts and the chat teardown on
//! logout.

use leptos::*;
use std::rc::Rc;

use super::stomp_socket::ChatSocket;

/// Global application state provided to all components
#[derive(Clone, Copy)]
pub struct GlobalState {
    /// Username from token introspection, `None` until known
    pub username: RwSignal<Option<String>>,
    /// Open chat connection, so logout can announce the exit
    pub chat: StoredValue<Option<Rc<ChatSocket>>>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        username: create_rw_signal(None),
        chat: store_value(None),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }

    /// Leave the chat room if one is open
    pub fn leave_chat(&self) {
        if let Some(socket) = self.chat.get_value() {
            socket.exit();
        }
        self.chat.set_value(None);
    }
}
