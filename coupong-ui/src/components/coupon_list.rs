//! Coupon Event List
//!
//! Lists running coupon drops and handles claim attempts. A claim locks the
//! apply buttons until its modal is dismissed; an accepted claim shows the
//! progress overlay first.

use leptos::*;

use coupong::coupon::claim::{ACCEPTED_MESSAGE, PROGRESS_DURATION, PROGRESS_MESSAGE};
use coupong::coupon::events::{FETCH_FAILED_MESSAGE, LOADING_MESSAGE};
use coupong::coupon::{ClaimPanel, ClaimRequest, CouponEvent, EventListing, Overlay};

use super::{Loading, Modal, ProgressOverlay};
use crate::api;
use crate::state::cookie;
use crate::state::global::GlobalState;

#[derive(Clone, PartialEq)]
enum ListState {
    Loading,
    Loaded(EventListing),
    Failed,
}

#[component]
pub fn CouponList() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let username = state.username;

    let listing = create_rw_signal(ListState::Loading);
    let panel = create_rw_signal(ClaimPanel::new());

    spawn_local(async move {
        match api::coupon_events().await {
            Ok(events) => listing.set(ListState::Loaded(events)),
            Err(e) => {
                web_sys::console::error_1(&format!("Coupon list failed: {}", e).into());
                listing.set(ListState::Failed);
            }
        }
    });

    let apply = move |category: String| {
        let mut started = false;
        panel.update(|p| started = p.begin());
        if !started {
            return;
        }

        let username = username.get_untracked().unwrap_or_default();
        let request = ClaimRequest::new(&category, &username, chrono::Utc::now().timestamp_millis());
        spawn_local(async move {
            let token = cookie::token().unwrap_or_default();
            let outcome = api::attempt_claim(&token, &request).await;
            let accepted = outcome.is_accepted();
            panel.update(|p| p.finish(outcome));

            if accepted {
                gloo_timers::callback::Timeout::new(PROGRESS_DURATION.as_millis() as u32, move || {
                    panel.update(ClaimPanel::progress_elapsed);
                })
                .forget();
            }
        });
    };

    view! {
        <section class="bg-white rounded-xl shadow p-6">
            <h2 class="text-xl font-semibold mb-4">"Coupon events"</h2>

            {move || match listing.get() {
                ListState::Loading => view! { <Loading message=LOADING_MESSAGE /> }.into_view(),
                ListState::Failed => view! {
                    <p class="text-red-600">{FETCH_FAILED_MESSAGE}</p>
                }.into_view(),
                ListState::Loaded(listing) => match listing.empty_message() {
                    Some(message) => view! { <p class="text-gray-500">{message}</p> }.into_view(),
                    None => listing
                        .events()
                        .iter()
                        .cloned()
                        .map(|event| view! { <CouponCard event=event panel=panel on_apply=apply /> })
                        .collect_view(),
                },
            }}

            {move || match panel.get().overlay() {
                Overlay::None => view! {}.into_view(),
                Overlay::Progress => view! { <ProgressOverlay message=PROGRESS_MESSAGE /> }.into_view(),
                Overlay::Success => view! {
                    <Modal message=ACCEPTED_MESSAGE on_confirm=move || panel.update(ClaimPanel::dismiss) />
                }.into_view(),
                Overlay::Failure(outcome) => view! {
                    <Modal
                        message=outcome.message()
                        error=true
                        on_confirm=move || panel.update(ClaimPanel::dismiss)
                    />
                }.into_view(),
            }}
        </section>
    }
}

#[component]
fn CouponCard<F>(event: CouponEvent, panel: RwSignal<ClaimPanel>, on_apply: F) -> impl IntoView
where
    F: Fn(String) + Copy + 'static,
{
    let logo = event.logo();
    let start = event.start_display().unwrap_or_default();
    let category = event.event_category.clone();

    view! {
        <div class="flex items-center justify-between py-4 border-b border-gray-200 last:border-0">
            <div class="flex items-center space-x-4">
                <img src=logo.asset_path() alt=logo.brand() class="w-14 h-14 rounded-lg object-contain" />
                <div>
                    <p class="font-semibold">{event.event_name.clone()}</p>
                    <p class="text-sm text-gray-500">{event.brand.clone().unwrap_or_else(|| logo.brand().to_string())}</p>
                    <p class="text-xs text-gray-400">{start}</p>
                </div>
            </div>
            <button
                on:click=move |_| on_apply(category.clone())
                disabled=move || !panel.get().can_apply()
                class="px-4 py-2 bg-orange-500 hover:bg-orange-600 disabled:bg-gray-300
                       disabled:cursor-not-allowed text-white rounded-lg font-medium transition-colors"
            >
                "Apply"
            </button>
        </div>
    }
}
