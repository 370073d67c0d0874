//! Sign-up Page
//!
//! The form stays locked until the ID passed the duplicate check and the
//! email passed verification; editing either field revokes the pass.

use leptos::*;
use leptos_router::*;

use coupong::auth::{AuthStep, Field, SignUpForm};

use crate::api;
use crate::components::input_box::FieldMessage;
use crate::components::InputBox;
use crate::state::global::GlobalState;

#[component]
pub fn SignUp() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();

    let form = create_rw_signal(SignUpForm::new());
    let id_message = create_rw_signal::<FieldMessage>(None);
    let mail_message = create_rw_signal::<FieldMessage>(None);
    let certification_message = create_rw_signal::<FieldMessage>(None);
    let password_message = create_rw_signal::<FieldMessage>(None);
    let password_check_message = create_rw_signal::<FieldMessage>(None);

    // field values mirrored for the inputs
    let id = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let password_check = create_rw_signal(String::new());
    let email = create_rw_signal(String::new());
    let certification = create_rw_signal(String::new());

    let check_id = move |_: ()| {
        let Some(request) = form.with_untracked(SignUpForm::id_check_request) else {
            id_message.set(Some((false, "Enter an ID first.".to_string())));
            return;
        };
        spawn_local(async move {
            match api::id_check(&request).await {
                Ok(reply) => {
                    let feedback = AuthStep::IdCheck.feedback(&reply.code);
                    if feedback.ok {
                        form.update(SignUpForm::mark_id_checked);
                    }
                    id_message.set(Some((feedback.ok, feedback.message.to_string())));
                }
                Err(e) => id_message.set(Some((false, e))),
            }
        });
    };

    let send_mail = move |_: ()| {
        let request = match form.with_untracked(SignUpForm::mail_request) {
            Ok(request) => request,
            Err(e) => {
                mail_message.set(Some((false, e.to_string())));
                return;
            }
        };
        spawn_local(async move {
            match api::send_mail(&request).await {
                Ok(reply) => {
                    let feedback = AuthStep::SendMail.feedback(&reply.code);
                    mail_message.set(Some((feedback.ok, feedback.message.to_string())));
                }
                Err(e) => mail_message.set(Some((false, e))),
            }
        });
    };

    let check_certification = move |_: ()| {
        let Some(request) = form.with_untracked(SignUpForm::certification_request) else {
            certification_message.set(Some((false, "Enter the verification number.".to_string())));
            return;
        };
        spawn_local(async move {
            match api::check_certification(&request).await {
                Ok(reply) => {
                    let feedback = AuthStep::CheckCertification.feedback(&reply.code);
                    if feedback.ok {
                        form.update(SignUpForm::mark_certified);
                    }
                    certification_message.set(Some((feedback.ok, feedback.message.to_string())));
                }
                Err(e) => certification_message.set(Some((false, e))),
            }
        });
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        password_message.set(None);
        password_check_message.set(None);

        let request = match form.with_untracked(SignUpForm::submit) {
            Ok(request) => request,
            Err(blocker) => {
                match blocker.field() {
                    Some(Field::Password) => password_message.set(Some((false, blocker.to_string()))),
                    Some(Field::PasswordCheck) => {
                        password_check_message.set(Some((false, blocker.to_string())))
                    }
                    _ => state.show_error(&blocker.to_string()),
                }
                return;
            }
        };

        let state = state.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match api::sign_up(&request).await {
                Ok(reply) => {
                    let feedback = AuthStep::SignUp.feedback(&reply.code);
                    if feedback.ok {
                        state.show_success(feedback.message);
                        navigate("/signIn", Default::default());
                    } else {
                        state.show_error(feedback.message);
                    }
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <div class="max-w-md mx-auto bg-white rounded-xl shadow p-8">
            <h1 class="text-2xl font-bold mb-6 text-center">"Sign up"</h1>
            <form on:submit=on_submit>
                <InputBox
                    label="ID"
                    value=id
                    on_input=move |v: String| {
                        form.update(|f| f.set_id(v.clone()));
                        id.set(v);
                        id_message.set(None);
                    }
                    message=id_message
                    button=("Check", Callback::new(check_id))
                />
                <InputBox
                    label="Password"
                    kind="password"
                    value=password
                    on_input=move |v: String| {
                        form.update(|f| f.set_password(v.clone()));
                        password.set(v);
                    }
                    message=password_message
                />
                <InputBox
                    label="Password again"
                    kind="password"
                    value=password_check
                    on_input=move |v: String| {
                        form.update(|f| f.set_password_check(v.clone()));
                        password_check.set(v);
                    }
                    message=password_check_message
                />
                <InputBox
                    label="Email"
                    kind="email"
                    value=email
                    on_input=move |v: String| {
                        form.update(|f| f.set_email(v.clone()));
                        email.set(v);
                        certification_message.set(None);
                    }
                    message=mail_message
                    button=("Send", Callback::new(send_mail))
                />
                <InputBox
                    label="Verification number"
                    value=certification
                    on_input=move |v: String| {
                        form.update(|f| f.set_certification(v.clone()));
                        certification.set(v);
                    }
                    message=certification_message
                    button=("Verify", Callback::new(check_certification))
                />

                <button
                    type="submit"
                    class="w-full bg-orange-500 hover:bg-orange-600 text-white rounded-lg py-3
                           font-semibold transition-colors"
                >
                    "Sign up"
                </button>
            </form>
            <p class="text-sm text-center text-gray-500 mt-4">
                "Already registered? "
                <A href="/signIn" class="text-orange-600 hover:underline">"Sign in"</A>
            </p>
        </div>
    }
}
