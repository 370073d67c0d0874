//! Request/Response DTOs
//!
//! Wire shapes of the coupon server's REST endpoints. Field names follow the
//! server's camelCase JSON.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::response::ResponseCode;

// ============================================
// Auth
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCheckRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCertificationRequest {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCertificationRequest {
    pub id: String,
    pub email: String,
    pub certification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub id: String,
    pub password: String,
    pub email: String,
    pub certification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub id: String,
    pub password: String,
}

/// Common `{ code, message }` envelope of the auth and mail endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub code: ResponseCode,
    #[serde(default)]
    pub message: Option<String>,
}

/// Sign-in reply; `token` and `expirationTime` are only set on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub code: ResponseCode,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expiration_time: Option<i64>,
}

/// Token handed out by a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_secs: i64,
}

impl IssuedToken {
    /// When the token lapses, counted from `now`. `None` unless the lifetime
    /// is a positive number of seconds that stays inside the calendar.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.expires_in_secs <= 0 {
            return None;
        }
        now.checked_add_signed(TimeDelta::try_seconds(self.expires_in_secs)?)
    }
}

impl SignInResponse {
    /// The token, when the code is `SUCCESS` and one was sent
    pub fn issued_token(&self) -> Option<IssuedToken> {
        if !self.code.is_success() {
            return None;
        }
        let token = self.token.clone().filter(|t| !t.is_empty())?;
        Some(IssuedToken {
            token,
            expires_in_secs: self.expiration_time.unwrap_or(0),
        })
    }
}

/// Token introspection result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "type", default)]
    pub login_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Role string granted to administrators
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

impl UserInfo {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}
