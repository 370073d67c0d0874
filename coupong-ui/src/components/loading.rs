//! Loading Component
//!
//! Spinners and the claim progress overlay.

use leptos::*;

/// Inline loading spinner with a caption
#[component]
pub fn Loading(
    #[prop(into)]
    message: String,
) -> impl IntoView {
    view! {
        <div class="flex items-center justify-center space-x-3 py-12 text-gray-500">
            <div class="loading-spinner w-6 h-6" />
            <span>{message}</span>
        </div>
    }
}

/// Full-screen overlay shown while a claim is processed
#[component]
pub fn ProgressOverlay(
    #[prop(into)]
    message: String,
) -> impl IntoView {
    view! {
        <div class="fixed inset-0 z-40 bg-gray-900/60 flex flex-col items-center justify-center text-white">
            <div class="loading-spinner w-12 h-12 mb-4" />
            <p class="text-lg font-semibold">{message}</p>
        </div>
    }
}
