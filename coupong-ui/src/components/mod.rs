//! UI Components
//!
//! Form pieces, overlays and the three main-page widgets.

pub mod chat_room;
pub mod coupon_list;
pub mod input_box;
pub mod leaderboard;
pub mod loading;
pub mod modal;
pub mod toast;

pub use chat_room::ChatRoom;
pub use coupon_list::CouponList;
pub use input_box::InputBox;
pub use leaderboard::Leaderboard;
pub use loading::{Loading, ProgressOverlay};
pub use modal::Modal;
pub use toast::Toast;
