//! Chat Widget
//!
//! Message log, participant count and the composer. Enter sends, Shift+Enter
//! adds a line; the composer stops at 200 characters.

use leptos::*;
use std::rc::Rc;

use coupong::api::endpoints::CHAT_PATH;
use coupong::chat::{ChatInput, ChatMessage, KeyAction, KeyPress};

use crate::api;
use crate::state::global::GlobalState;
use crate::state::stomp_socket::{ChatSocket, RoomEvent};

#[component]
pub fn ChatRoom(
    #[prop(into)]
    username: String,
) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let messages = create_rw_signal(Vec::<ChatMessage>::new());
    let participants = create_rw_signal(0u32);
    let connected = create_rw_signal(false);
    let input = create_rw_signal(ChatInput::new());

    let endpoints = api::endpoints();
    let socket = ChatSocket::connect(
        &endpoints.chat_socket(CHAT_PATH),
        endpoints.host(),
        &username,
        move |event| match event {
            RoomEvent::Joined => connected.set(true),
            RoomEvent::Message(message) => messages.update(|m| m.push(message)),
            RoomEvent::Participants(count) => participants.set(count),
            RoomEvent::ParticipantList(users) => {
                web_sys::console::log_1(&format!("In the room: {}", users.join(", ")).into());
            }
            RoomEvent::Closed => connected.set(false),
        },
    );
    let socket: Option<Rc<ChatSocket>> = match socket {
        Ok(socket) => Some(socket),
        Err(e) => {
            web_sys::console::error_1(&e.into());
            None
        }
    };
    state.chat.set_value(socket.clone());
    let socket = store_value(socket);

    let leave_state = state.clone();
    let unload = window_event_listener(ev::beforeunload, move |_| leave_state.leave_chat());
    let cleanup_state = state.clone();
    on_cleanup(move || {
        unload.remove();
        cleanup_state.leave_chat();
    });

    let submit = move || {
        let Some(socket) = socket.get_value() else {
            return;
        };
        let text = input.get_untracked().text().to_string();
        let error_state = state.clone();
        spawn_local(async move {
            match socket.send(&text).await {
                Ok(()) => input.update(|i| {
                    i.clear_sent(&text);
                }),
                Err(e) => error_state.show_error(&e),
            }
        });
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        let key = ev.key();
        let press = KeyPress {
            key: &key,
            shift: ev.shift_key(),
            composing: ev.is_composing(),
        };
        match press.action() {
            KeyAction::Submit => {
                ev.prevent_default();
                submit();
            }
            KeyAction::InsertNewline => {
                ev.prevent_default();
                input.update(|i| {
                    i.insert_newline();
                });
            }
            KeyAction::Default => {}
        }
    };

    let me = username.clone();

    view! {
        <section class="bg-white rounded-xl shadow p-6 flex flex-col h-[32rem]">
            <div class="flex items-center justify-between mb-4">
                <h2 class="text-xl font-semibold">"Chat"</h2>
                <span class="text-sm text-gray-500">
                    {move || if connected.get() {
                        format!("{} online", participants.get())
                    } else {
                        "Connecting...".to_string()
                    }}
                </span>
            </div>

            <div class="flex-1 overflow-y-auto space-y-2 mb-4">
                {move || messages.get().into_iter().map(|message| {
                    let class = message.kind(&me).css_class();
                    view! {
                        <div class=class>
                            <span class="writer">{message.writer.clone()}</span>
                            <p class="whitespace-pre-wrap">{message.message.clone()}</p>
                            <span class="time">{message.created_date.clone()}</span>
                        </div>
                    }
                }).collect_view()}
            </div>

            <div class="relative">
                <textarea
                    prop:value=move || input.with(|i| i.text().to_string())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        input.update(|i| {
                            i.set_text(&value);
                        });
                    }
                    on:keydown=on_keydown
                    rows=3
                    class="w-full border border-gray-300 rounded-lg px-3 py-2 resize-none
                           focus:border-orange-500 focus:outline-none"
                />
                <span class="absolute bottom-2 right-3 text-xs text-gray-400">
                    {move || input.with(ChatInput::counter)}
                </span>
            </div>
            <button
                on:click=move |_| submit()
                disabled=move || !connected.get()
                class="mt-2 self-end px-4 py-2 bg-orange-500 text-white rounded-lg
                       hover:bg-orange-600 disabled:opacity-50"
            >
                "Send"
            </button>
        </section>
    }
}
