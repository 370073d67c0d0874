//! Sign-in Page

use chrono::Utc;
use leptos::*;
use leptos_router::*;

use coupong::auth::{AuthStep, SignInForm};

use crate::api;
use crate::components::InputBox;
use crate::state::cookie;

#[component]
pub fn SignIn() -> impl IntoView {
    let navigate = use_navigate();

    let id = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let message = create_rw_signal(None::<String>);
    let submitting = create_rw_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let form = SignInForm::new(id.get_untracked(), password.get_untracked());
        let request = match form.submit() {
            Ok(request) => request,
            Err(e) => {
                message.set(Some(e.to_string()));
                return;
            }
        };

        submitting.set(true);
        let navigate = navigate.clone();
        spawn_local(async move {
            match api::sign_in(&request).await {
                Ok(reply) => {
                    let feedback = AuthStep::SignIn.feedback(&reply.code);
                    match reply.issued_token() {
                        Some(issued) => match issued.expires_at(Utc::now()) {
                            Some(expires) => {
                                cookie::store_token(&issued.token, expires);
                                navigate("/", Default::default());
                            }
                            None => {
                                web_sys::console::error_1(
                                    &format!("Unusable token lifetime: {}", issued.expires_in_secs).into(),
                                );
                                message.set(Some("Sign-in failed. Please try again.".to_string()));
                            }
                        },
                        None => message.set(Some(feedback.message.to_string())),
                    }
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Sign-in failed: {}", e).into());
                    message.set(Some(e));
                }
            }
            submitting.set(false);
        });
    };

    view! {
        <div class="max-w-md mx-auto bg-white rounded-xl shadow p-8">
            <h1 class="text-2xl font-bold mb-6 text-center">"Sign in"</h1>
            <form on:submit=on_submit>
                <InputBox label="ID" value=id on_input=move |v| id.set(v) />
                <InputBox label="Password" kind="password" value=password on_input=move |v| password.set(v) />

                {move || message.get().map(|m| view! { <p class="text-red-600 text-sm mb-4">{m}</p> })}

                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="w-full bg-orange-500 hover:bg-orange-600 disabled:bg-gray-300
                           text-white rounded-lg py-3 font-semibold transition-colors"
                >
                    "Sign in"
                </button>
            </form>
            <p class="text-sm text-center text-gray-500 mt-4">
                "No account yet? "
                <A href="/signUp" class="text-orange-600 hover:underline">"Sign up"</A>
            </p>
        </div>
    }
}
