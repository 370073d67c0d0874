//! Main Page
//!
//! Greeting, logout and the three widgets. Without a valid token the user is
//! sent to sign-in; the widgets mount once the username is known.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::components::{ChatRoom, CouponList, Leaderboard, Loading};
use crate::state::cookie;
use crate::state::global::GlobalState;

#[component]
pub fn Main() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();
    let username = state.username;

    match cookie::token() {
        None => navigate("/signIn", Default::default()),
        Some(token) => {
            let navigate = navigate.clone();
            spawn_local(async move {
                match api::token_decryption(&token).await {
                    Ok(user) => username.set(Some(user.username)),
                    Err(e) => {
                        web_sys::console::error_1(&format!("Session check failed: {}", e).into());
                        navigate("/signIn", Default::default());
                    }
                }
            });
        }
    }

    let logout_state = state.clone();
    let logout = move |_| {
        logout_state.leave_chat();
        cookie::remove_cookie(cookie::ACCESS_TOKEN);
        username.set(None);
        navigate("/signIn", Default::default());
    };

    view! {
        <div class="space-y-8">
            <div class="flex items-center justify-between">
                <h1 class="text-3xl font-bold">
                    {move || username.get().map(|name| format!("Hello, {}!", name)).unwrap_or_default()}
                </h1>
                <button
                    on:click=logout
                    class="px-4 py-2 bg-gray-700 hover:bg-gray-800 text-white rounded-lg text-sm"
                >
                    "Log out"
                </button>
            </div>

            {move || match username.get() {
                None => view! { <Loading message="Checking your session..." /> }.into_view(),
                Some(name) => view! {
                    <div class="grid lg:grid-cols-3 gap-8">
                        <Leaderboard />
                        <CouponList />
                        <ChatRoom username=name />
                    </div>
                }.into_view(),
            }}
        </div>
    }
}
