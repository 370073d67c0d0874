//! Access-token cookie
//!
//! Reads and writes `document.cookie`. The token is stored under
//! [`ACCESS_TOKEN`] with `path=/` and an expiry taken from the sign-in reply.

use chrono::{DateTime, Utc};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

pub const ACCESS_TOKEN: &str = "accessToken";

fn document() -> Option<HtmlDocument> {
    web_sys::window()?.document()?.dyn_into::<HtmlDocument>().ok()
}

pub fn get_cookie(name: &str) -> Option<String> {
    let cookies = document()?.cookie().ok()?;
    find_cookie(&cookies, name)
}

pub fn set_cookie(name: &str, value: &str, expires: Option<DateTime<Utc>>) {
    let Some(document) = document() else {
        return;
    };
    if let Err(e) = document.set_cookie(&cookie_assignment(name, value, expires)) {
        web_sys::console::error_1(&format!("Failed to set cookie {}: {:?}", name, e).into());
    }
}

pub fn remove_cookie(name: &str) {
    set_cookie(name, "", Some(DateTime::UNIX_EPOCH));
}

/// Store a freshly issued token until `expires`
pub fn store_token(token: &str, expires: DateTime<Utc>) {
    set_cookie(ACCESS_TOKEN, token, Some(expires));
}

pub fn token() -> Option<String> {
    get_cookie(ACCESS_TOKEN).filter(|t| !t.is_empty())
}

/// Value of `name` in a `document.cookie` string
fn find_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| decode(value))
    })
}

fn cookie_assignment(name: &str, value: &str, expires: Option<DateTime<Utc>>) -> String {
    let mut assignment = format!("{}={}; path=/", name, encode(value));
    if let Some(expires) = expires {
        assignment.push_str("; expires=");
        assignment.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
    }
    assignment
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
