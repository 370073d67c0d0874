//! Leaderboard Widget
//!
//! Category selector, per-category winner cards and the live stream. A new
//! winner in a shown category plays a short celebration.

use leptos::*;

use coupong::leaderboard::board::{ALL, CELEBRATION, NO_WINNERS_MESSAGE};
use coupong::leaderboard::{Leaderboard as Board, Medal, Selection};

use crate::api;
use crate::state::event_source::{LeaderboardStream, StreamSignal};

#[component]
pub fn Leaderboard() -> impl IntoView {
    let board = create_rw_signal(Board::new());
    let celebrating = create_rw_signal(false);
    let stream = store_value(None::<LeaderboardStream>);

    let load = move |selection: Selection| {
        board.update(|b| b.select(selection.clone()));
        let generation = board.with_untracked(Board::generation);

        for category in board.with_untracked(Board::snapshot_categories) {
            spawn_local(async move {
                let reply = api::leaderboard_snapshot(&category).await;
                if !board.with_untracked(|b| b.is_current(generation)) {
                    return;
                }
                match reply {
                    Ok(winners) => board.update(|b| b.apply_snapshot(&category, winners)),
                    Err(e) => {
                        web_sys::console::error_1(&format!("Snapshot {} failed: {}", category, e).into());
                        board.update(|b| b.snapshot_failed(&category));
                    }
                }
            });
        }

        let url = api::endpoints().leaderboard_stream(selection.as_query());
        let opened = LeaderboardStream::open(&url, move |signal| match signal {
            StreamSignal::Opened => board.update(Board::stream_opened),
            StreamSignal::Update(update) => {
                let mut celebrate = false;
                board.update(|b| celebrate = b.apply_update(&update));
                if celebrate {
                    celebrating.set(true);
                    gloo_timers::callback::Timeout::new(CELEBRATION.as_millis() as u32, move || {
                        celebrating.set(false);
                    })
                    .forget();
                }
            }
            StreamSignal::Failed => board.update(Board::stream_failed),
        });
        // replacing the old stream drops (and closes) it
        stream.set_value(Some(opened));
    };

    spawn_local(async move {
        match api::leaderboard_categories().await {
            Ok(categories) => {
                board.update(|b| b.set_categories(categories));
                load(Selection::All);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Category list failed: {}", e).into());
                board.update(Board::categories_failed);
            }
        }
    });

    on_cleanup(move || stream.set_value(None));

    view! {
        <section class="bg-white rounded-xl shadow p-6 relative">
            <div class="flex items-center justify-between mb-4">
                <h2 class="text-xl font-semibold">"Leaderboard"</h2>
                <select
                    on:change=move |ev| load(Selection::parse(&event_target_value(&ev)))
                    class="bg-white border border-gray-300 rounded-lg px-3 py-1 text-sm"
                >
                    <option value=ALL>"All"</option>
                    {move || board.with(|b| b.categories().to_vec())
                        .into_iter()
                        .map(|category| view! { <option value=category.clone()>{category.clone()}</option> })
                        .collect_view()}
                </select>
            </div>

            <div class="grid md:grid-cols-2 gap-4">
                {move || board.with(|b| {
                    b.displayed_categories()
                        .into_iter()
                        .map(|category| category_card(category, b))
                        .collect_view()
                })}
            </div>

            {move || board.with(Board::message).map(|message| view! {
                <p class="text-sm text-gray-500 mt-4">{message}</p>
            })}

            {move || celebrating.get().then(|| view! {
                <div class="absolute inset-0 flex items-center justify-center pointer-events-none">
                    <img src="/assets/celebration.gif" alt="New winner!" class="w-48" />
                </div>
            })}
        </section>
    }
}

fn category_card(category: &str, board: &Board) -> View {
    let winners = board.winners(category);
    let rows = if winners.is_empty() {
        view! { <li class="text-gray-400 text-sm">{NO_WINNERS_MESSAGE}</li> }.into_view()
    } else {
        winners
            .iter()
            .enumerate()
            .map(|(rank, winner)| {
                let medal = Medal::for_rank(rank).map(|medal| view! {
                    <img src=medal.asset_path() alt=medal.label() class="w-5 h-5" />
                });
                view! {
                    <li class="flex items-center space-x-2 py-1">
                        <span class="w-6 text-right text-gray-500">{rank + 1}</span>
                        {medal}
                        <span>{winner.user_id.clone()}</span>
                    </li>
                }
            })
            .collect_view()
    };

    view! {
        <div class="border border-gray-200 rounded-lg p-4">
            <h3 class="font-semibold mb-2">{category.to_string()}</h3>
            <ul>{rows}</ul>
        </div>
    }
    .into_view()
}
