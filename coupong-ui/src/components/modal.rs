//! Modal dialog with a single confirm button

use leptos::*;

#[component]
pub fn Modal<F>(
    #[prop(into)]
    message: String,
    #[prop(default = false)]
    error: bool,
    on_confirm: F,
) -> impl IntoView
where
    F: Fn() + 'static,
{
    let title_class = if error { "text-red-600" } else { "text-green-600" };
    let title = if error { "Sorry" } else { "Done" };

    view! {
        <div class="fixed inset-0 z-50 bg-gray-900/60 flex items-center justify-center">
            <div class="bg-white rounded-xl shadow-xl p-6 w-80 text-center">
                <h2 class=format!("text-xl font-bold mb-3 {}", title_class)>{title}</h2>
                <p class="text-gray-700 mb-6">{message}</p>
                <button
                    on:click=move |_| on_confirm()
                    class="px-6 py-2 bg-orange-500 hover:bg-orange-600 text-white rounded-lg font-medium"
                >
                    "OK"
                </button>
            </div>
        </div>
    }
}
