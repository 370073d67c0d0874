//! Labelled form input with an optional side button and a feedback line

use leptos::*;

/// Feedback under an input: `(ok, message)`
pub type FieldMessage = Option<(bool, String)>;

#[component]
pub fn InputBox(
    label: &'static str,
    #[prop(default = "text")]
    kind: &'static str,
    #[prop(into)]
    value: Signal<String>,
    #[prop(into)]
    on_input: Callback<String>,
    #[prop(into, optional)]
    message: Option<Signal<FieldMessage>>,
    #[prop(optional)]
    button: Option<(&'static str, Callback<()>)>,
) -> impl IntoView {
    view! {
        <div class="mb-4">
            <label class="block text-sm text-gray-600 mb-1">{label}</label>
            <div class="flex space-x-2">
                <input
                    type=kind
                    prop:value=move || value.get()
                    on:input=move |ev| on_input.call(event_target_value(&ev))
                    class="flex-1 bg-white rounded-lg px-4 py-2 border border-gray-300
                           focus:border-orange-500 focus:outline-none"
                />
                {button.map(|(text, on_click)| view! {
                    <button
                        type="button"
                        on:click=move |_| on_click.call(())
                        class="px-4 py-2 bg-gray-700 hover:bg-gray-800 text-white rounded-lg text-sm"
                    >
                        {text}
                    </button>
                })}
            </div>
            {move || {
                message.and_then(|m| m.get()).map(|(ok, text)| {
                    let class = if ok { "text-green-600" } else { "text-red-600" };
                    view! { <p class=format!("text-sm mt-1 {}", class)>{text}</p> }
                })
            }}
        </div>
    }
}
