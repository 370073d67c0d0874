//! HTTP API Client
//!
//! Functions for communicating with the coupon server. Errors come back as
//! display strings; the wire types are shared with the native client.

use gloo_net::http::{Request, Response};
use serde::Serialize;

use coupong::api::dto::{
    CheckCertificationRequest, EmailCertificationRequest, IdCheckRequest, ResponseBody,
    SignInRequest, SignInResponse, SignUpRequest, UserInfo,
};
use coupong::api::{Endpoints, DEFAULT_DOMAIN};
use coupong::chat::FilterReport;
use coupong::coupon::{ClaimOutcome, ClaimRequest, EventListing};
use coupong::leaderboard::{parse_snapshot, Winner};

const DOMAIN_KEY: &str = "coupong_domain";

/// Server domain from local storage, or the default
pub fn get_domain() -> String {
    let domain = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(DOMAIN_KEY).ok().flatten())
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
    domain.trim_end_matches('/').to_string()
}

pub fn endpoints() -> Endpoints {
    Endpoints::new(&get_domain())
}

// ============ Auth ============

pub async fn id_check(request: &IdCheckRequest) -> Result<ResponseBody, String> {
    post_envelope(&endpoints().id_check(), request).await
}

pub async fn send_mail(request: &EmailCertificationRequest) -> Result<ResponseBody, String> {
    post_envelope(&endpoints().send_mail(), request).await
}

pub async fn check_certification(
    request: &CheckCertificationRequest,
) -> Result<ResponseBody, String> {
    post_envelope(&endpoints().check_certification(), request).await
}

pub async fn sign_up(request: &SignUpRequest) -> Result<ResponseBody, String> {
    post_envelope(&endpoints().sign_up(), request).await
}

pub async fn sign_in(request: &SignInRequest) -> Result<SignInResponse, String> {
    post_envelope(&endpoints().sign_in(), request).await
}

/// Introspect an access token
pub async fn token_decryption(token: &str) -> Result<UserInfo, String> {
    let response = Request::get(&endpoints().token_decryption())
        .header("Authorization", token)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(format!("Token rejected ({})", response.status()));
    }
    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

/// POST to an endpoint that answers with the `{ code, message }` envelope.
/// Error statuses still carry the envelope, so the body is read either way.
async fn post_envelope<B, T>(url: &str, body: &B) -> Result<T, String>
where
    B: Serialize,
    T: serde::de::DeserializeOwned,
{
    let response = Request::post(url)
        .json(body)
        .map_err(|e| format!("Encode error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(format!("Empty response ({})", status));
    }
    serde_json::from_str(&text).map_err(|e| {
        if (200..300).contains(&status) {
            format!("Parse error: {}", e)
        } else {
            format!("Request failed ({}): {}", status, text)
        }
    })
}

// ============ Coupons ============

pub async fn coupon_events() -> Result<EventListing, String> {
    let response = Request::get(&endpoints().coupon_events())
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    let response = ensure_ok(response)?;

    let text = response.text().await.map_err(|e| format!("Read error: {}", e))?;
    if text.trim().is_empty() {
        return Ok(EventListing::NoEvents);
    }
    let value = serde_json::from_str(&text).map_err(|e| format!("Parse error: {}", e))?;
    EventListing::from_value(value).map_err(|e| format!("Parse error: {}", e))
}

/// Every failure maps onto an outcome the claim modal can show
pub async fn attempt_claim(token: &str, request: &ClaimRequest) -> ClaimOutcome {
    let sent = match Request::post(&endpoints().coupon_attempt())
        .header("Authorization", token)
        .json(request)
    {
        Ok(request) => request.send().await,
        Err(e) => {
            web_sys::console::error_1(&format!("Claim encode error: {}", e).into());
            return ClaimOutcome::RequestFailed;
        }
    };

    match sent {
        Ok(response) => {
            let outcome = ClaimOutcome::from_status(response.status());
            web_sys::console::log_1(
                &format!("Claim {} -> {}", request.coupon_category, response.status()).into(),
            );
            outcome
        }
        Err(e) => {
            web_sys::console::error_1(&format!("Claim request failed: {}", e).into());
            ClaimOutcome::RequestFailed
        }
    }
}

// ============ Chat ============

/// Report a send attempt. `Ok(false)` means the server refused the message.
pub async fn report_filtering(report: &FilterReport) -> Result<bool, String> {
    let response = Request::post(&endpoints().filtering())
        .json(report)
        .map_err(|e| format!("Encode error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    match response.status() {
        200..=299 => Ok(true),
        400..=499 => Ok(false),
        status => Err(format!("Filtering failed ({})", status)),
    }
}

// ============ Leaderboard ============

pub async fn leaderboard_categories() -> Result<Vec<String>, String> {
    let response = Request::get(&endpoints().leaderboard_categories())
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    ensure_ok(response)?
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

pub async fn leaderboard_snapshot(category: &str) -> Result<Vec<Winner>, String> {
    let response = Request::get(&endpoints().leaderboard_snapshot(category))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    let body: serde_json::Value = ensure_ok(response)?
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))?;
    Ok(parse_snapshot(category, &body))
}

fn ensure_ok(response: Response) -> Result<Response, String> {
    if response.ok() {
        Ok(response)
    } else {
        Err(format!("Request failed ({})", response.status()))
    }
}
