//! Admin Page
//!
//! Admits `ROLE_ADMIN` sessions only; everyone else goes to sign-in.

use leptos::*;
use leptos_router::*;

use coupong::api::UserInfo;

use crate::api;
use crate::components::Loading;
use crate::state::cookie;

#[component]
pub fn Admin() -> impl IntoView {
    let navigate = use_navigate();
    let admin = create_rw_signal(None::<UserInfo>);

    match cookie::token() {
        None => navigate("/signIn", Default::default()),
        Some(token) => spawn_local(async move {
            match api::token_decryption(&token).await {
                Ok(user) if user.is_admin() => admin.set(Some(user)),
                Ok(user) => {
                    web_sys::console::warn_1(&format!("{} is not an administrator", user.username).into());
                    navigate("/signIn", Default::default());
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Session check failed: {}", e).into());
                    navigate("/signIn", Default::default());
                }
            }
        }),
    }

    view! {
        {move || match admin.get() {
            None => view! { <Loading message="Checking permissions..." /> }.into_view(),
            Some(user) => view! {
                <div class="max-w-lg mx-auto bg-white rounded-xl shadow p-8">
                    <h1 class="text-2xl font-bold mb-4">"Admin"</h1>
                    <dl class="grid grid-cols-3 gap-2 text-sm">
                        <dt class="text-gray-500">"User"</dt>
                        <dd class="col-span-2">{user.username.clone()}</dd>
                        <dt class="text-gray-500">"Email"</dt>
                        <dd class="col-span-2">{user.email.clone().unwrap_or_default()}</dd>
                        <dt class="text-gray-500">"Login type"</dt>
                        <dd class="col-span-2">{user.login_type.clone().unwrap_or_default()}</dd>
                        <dt class="text-gray-500">"Role"</dt>
                        <dd class="col-span-2">{user.role.clone().unwrap_or_default()}</dd>
                    </dl>
                </div>
            }.into_view(),
        }}
    }
}
