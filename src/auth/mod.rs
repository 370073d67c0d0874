//! Authentication
//!
//! Form rules and server response codes are shared with the browser front
//! end; the cookie jar and session need the `native` feature.

#[cfg(feature = "native")]
pub mod cookie;
pub mod response;
#[cfg(feature = "native")]
pub mod session;
pub mod validation;

#[cfg(feature = "native")]
pub use cookie::{CookieError, CookieJar, ACCESS_TOKEN};
pub use response::{AuthStep, Feedback, ResponseCode};
#[cfg(feature = "native")]
pub use session::{Session, SessionError};
pub use validation::{
    email_is_valid, password_is_valid, Field, MailBlocker, MissingCredentials, SignInForm, SignUpBlocker,
    SignUpForm,
};
