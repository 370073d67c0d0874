//! Pages
//!
//! Top-level page components for each route.

pub mod admin;
pub mod main_page;
pub mod sign_in;
pub mod sign_up;

pub use admin::Admin;
pub use main_page::Main;
pub use sign_in::SignIn;
pub use sign_up::SignUp;
