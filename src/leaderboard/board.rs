//! Leaderboard view state
//!
//! Holds the winner list of every category on display. Snapshots seed the
//! lists, stream updates replace them wholesale.

use std::time::Duration;

use super::payload::{Winner, WinnerUpdate};

/// Selection value meaning every category
pub const ALL: &str = "ALL";

/// How long the celebration plays after a new winner shows up
pub const CELEBRATION: Duration = Duration::from_secs(3);

pub const NO_WINNERS_MESSAGE: &str = "No winners yet.";
pub const STREAM_ERROR_MESSAGE: &str = "Cannot receive leaderboard updates.";
pub const CATEGORY_ERROR_MESSAGE: &str = "There was a problem loading the categories.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Category(String),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL) {
            Selection::All
        } else {
            Selection::Category(value.to_string())
        }
    }

    /// Value for the `couponCategory` query parameter
    pub fn as_query(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Category(category) => category,
        }
    }
}

/// Trophy for the first three ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// `rank` is zero-based
    pub fn for_rank(rank: usize) -> Option<Medal> {
        match rank {
            0 => Some(Medal::Gold),
            1 => Some(Medal::Silver),
            2 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn asset_path(&self) -> &'static str {
        match self {
            Medal::Gold => "/assets/images/gold-trophy.png",
            Medal::Silver => "/assets/images/silver-trophy.png",
            Medal::Bronze => "/assets/images/bronze-trophy.png",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Medal::Gold => "gold",
            Medal::Silver => "silver",
            Medal::Bronze => "bronze",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryBoard {
    category: String,
    winners: Vec<Winner>,
}

#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    categories: Vec<String>,
    /// `None` until the category list has loaded
    selection: Option<Selection>,
    boards: Vec<CategoryBoard>,
    message: Option<&'static str>,
    /// Bumped on every selection change
    generation: u64,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Category list arrived; the board switches to `All`
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = categories;
        self.select(Selection::All);
    }

    pub fn categories_failed(&mut self) {
        self.message = Some(CATEGORY_ERROR_MESSAGE);
    }

    /// Switch the view; lists from the previous selection are dropped
    pub fn select(&mut self, selection: Selection) {
        self.boards.clear();
        self.selection = Some(selection);
        self.generation += 1;
    }

    /// Tag for snapshot requests issued under the current selection
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a reply tagged `generation` still belongs to the shown selection
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Categories whose snapshot the current selection needs
    pub fn snapshot_categories(&self) -> Vec<String> {
        match &self.selection {
            Some(Selection::All) => self.categories.clone(),
            Some(Selection::Category(category)) => vec![category.clone()],
            None => Vec::new(),
        }
    }

    pub fn apply_snapshot(&mut self, category: &str, winners: Vec<Winner>) {
        if self.shows(category) {
            self.put(category, winners);
        }
    }

    /// Snapshot request failed. Under `All` the category shows an empty
    /// list; a single selection clears and says there are no winners.
    pub fn snapshot_failed(&mut self, category: &str) {
        match &self.selection {
            Some(Selection::All) => self.put(category, Vec::new()),
            Some(Selection::Category(selected)) if selected == category => {
                self.boards.clear();
                self.message = Some(NO_WINNERS_MESSAGE);
            }
            _ => {}
        }
    }

    /// Apply a stream push. Returns `true` when the celebration should play.
    pub fn apply_update(&mut self, update: &WinnerUpdate) -> bool {
        if !self.shows(&update.coupon_category) {
            return false;
        }

        let previous = self.winners(&update.coupon_category).len();
        let celebrate = !update.winners.is_empty() && previous != update.winners.len();
        self.put(&update.coupon_category, update.rows());
        celebrate
    }

    pub fn stream_opened(&mut self) {
        self.message = None;
    }

    pub fn stream_failed(&mut self) {
        self.message = Some(STREAM_ERROR_MESSAGE);
    }

    /// Status line under the board
    pub fn message(&self) -> Option<&'static str> {
        self.message
    }

    pub fn winners(&self, category: &str) -> &[Winner] {
        self.boards
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.winners.as_slice())
            .unwrap_or(&[])
    }

    /// Category cards in display order
    pub fn displayed_categories(&self) -> Vec<&str> {
        match &self.selection {
            Some(Selection::All) => self.boards.iter().map(|b| b.category.as_str()).collect(),
            Some(Selection::Category(category)) => vec![category.as_str()],
            None => Vec::new(),
        }
    }

    fn shows(&self, category: &str) -> bool {
        match &self.selection {
            Some(Selection::All) => true,
            Some(Selection::Category(selected)) => selected == category,
            None => false,
        }
    }

    fn put(&mut self, category: &str, winners: Vec<Winner>) {
        match self.boards.iter_mut().find(|b| b.category == category) {
            Some(board) => board.winners = winners,
            None => self.boards.push(CategoryBoard {
                category: category.to_string(),
                winners,
            }),
        }
    }
}
