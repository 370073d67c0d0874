//! Endpoint URLs of the coupon server
//!
//! Everything hangs off one domain: REST under `/api/v1`, the leaderboard
//! under `/api/categories` and `/sse/leaderboard`, the chat socket at `/chat`.

/// Server the client talks to when nothing else is configured
pub const DEFAULT_DOMAIN: &str = "http://localhost:4040";

/// Path prefix of the versioned REST API
pub const API_PREFIX: &str = "/api/v1";

/// Default path of the STOMP WebSocket endpoint
pub const CHAT_PATH: &str = "/chat";

/// URL builder for one server domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    domain: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN)
    }
}

impl Endpoints {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.trim_end_matches('/').to_string(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn api_root(&self) -> String {
        format!("{}{}", self.domain, API_PREFIX)
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}{}", self.domain, API_PREFIX, path)
    }

    pub fn id_check(&self) -> String {
        self.api("/auth/idCheck")
    }

    pub fn send_mail(&self) -> String {
        self.api("/mail/sendMail")
    }

    pub fn check_certification(&self) -> String {
        self.api("/mail/checkCertification")
    }

    pub fn sign_up(&self) -> String {
        self.api("/auth/signUp")
    }

    pub fn sign_in(&self) -> String {
        self.api("/auth/signIn")
    }

    pub fn token_decryption(&self) -> String {
        self.api("/auth/tokenDecryption")
    }

    pub fn coupon_events(&self) -> String {
        self.api("/coupons")
    }

    pub fn coupon_attempt(&self) -> String {
        self.api("/coupon-event/attempt")
    }

    pub fn filtering(&self) -> String {
        self.api("/filtering")
    }

    pub fn leaderboard_categories(&self) -> String {
        format!("{}/api/categories", self.domain)
    }

    pub fn leaderboard_snapshot(&self, category: &str) -> String {
        format!(
            "{}/sse/leaderboard?couponCategory={}",
            self.domain,
            urlencoding::encode(category)
        )
    }

    pub fn leaderboard_stream(&self, category: &str) -> String {
        format!(
            "{}/sse/leaderboard/stream?couponCategory={}",
            self.domain,
            urlencoding::encode(category)
        )
    }

    /// WebSocket URL of the chat endpoint (`http` becomes `ws`, `https` becomes `wss`)
    pub fn chat_socket(&self, path: &str) -> String {
        let base = if let Some(rest) = self.domain.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.domain.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.domain.clone()
        };
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Host part of the domain, used for the STOMP `host` header
    pub fn host(&self) -> &str {
        let rest = self
            .domain
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.domain);
        let authority = rest.split('/').next().unwrap_or(rest);
        authority.split(':').next().unwrap_or(authority)
    }
}
