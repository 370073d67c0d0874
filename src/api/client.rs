//! Coupon server REST client
//!
//! One method per endpoint. The auth and mail endpoints answer errors with
//! the same `{ code, message }` envelope they use for success, so 4xx bodies
//! are decoded rather than turned into errors.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::dto::{
    CheckCertificationRequest, EmailCertificationRequest, IdCheckRequest, ResponseBody,
    SignInRequest, SignInResponse, SignUpRequest, UserInfo,
};
use super::endpoints::Endpoints;
use super::error::ApiError;
use crate::chat::message::FilterReport;
use crate::coupon::claim::{ClaimOutcome, ClaimRequest};
use crate::coupon::events::EventListing;
use crate::leaderboard::payload::{parse_snapshot, Winner};

#[derive(Clone)]
pub struct CoupongClient {
    client: Client,
    endpoints: Endpoints,
}

impl CoupongClient {
    pub fn new(endpoints: Endpoints, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ============================================
    // Auth
    // ============================================

    pub async fn id_check(&self, request: &IdCheckRequest) -> Result<ResponseBody, ApiError> {
        self.post_envelope(&self.endpoints.id_check(), request).await
    }

    pub async fn send_mail(
        &self,
        request: &EmailCertificationRequest,
    ) -> Result<ResponseBody, ApiError> {
        self.post_envelope(&self.endpoints.send_mail(), request).await
    }

    pub async fn check_certification(
        &self,
        request: &CheckCertificationRequest,
    ) -> Result<ResponseBody, ApiError> {
        self.post_envelope(&self.endpoints.check_certification(), request)
            .await
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<ResponseBody, ApiError> {
        self.post_envelope(&self.endpoints.sign_up(), request).await
    }

    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignInResponse, ApiError> {
        self.post_envelope(&self.endpoints.sign_in(), request).await
    }

    /// Introspect a token. The token goes into `Authorization` as stored.
    pub async fn token_decryption(&self, token: &str) -> Result<UserInfo, ApiError> {
        let response = self
            .client
            .get(self.endpoints.token_decryption())
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        decode_json(ensure_success(response).await?).await
    }

    // ============================================
    // Coupons
    // ============================================

    pub async fn coupon_events(&self) -> Result<EventListing, ApiError> {
        let response = self
            .client
            .get(self.endpoints.coupon_events())
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        let response = ensure_success(response).await?;

        let text = response.text().await.map_err(ApiError::from_transport)?;
        if text.trim().is_empty() {
            return Ok(EventListing::NoEvents);
        }
        let value: Value =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        EventListing::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Attempt a claim. Never fails: a request that got no answer maps to
    /// [`ClaimOutcome::RequestFailed`].
    pub async fn attempt_claim(&self, token: &str, request: &ClaimRequest) -> ClaimOutcome {
        let result = self
            .client
            .post(self.endpoints.coupon_attempt())
            .header(reqwest::header::AUTHORIZATION, token)
            .json(request)
            .send()
            .await;

        match result {
            Ok(response) => {
                let outcome = ClaimOutcome::from_status(response.status().as_u16());
                tracing::info!(
                    category = %request.coupon_category,
                    status = response.status().as_u16(),
                    ?outcome,
                    "coupon attempt answered"
                );
                outcome
            }
            Err(e) => {
                tracing::error!(category = %request.coupon_category, error = %e, "coupon attempt failed");
                ClaimOutcome::RequestFailed
            }
        }
    }

    // ============================================
    // Chat
    // ============================================

    pub async fn report_filtering(&self, report: &FilterReport) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoints.filtering())
            .json(report)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        ensure_success(response).await?;
        Ok(())
    }

    // ============================================
    // Leaderboard
    // ============================================

    pub async fn leaderboard_categories(&self) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .get(self.endpoints.leaderboard_categories())
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        decode_json(ensure_success(response).await?).await
    }

    pub async fn leaderboard_snapshot(&self, category: &str) -> Result<Vec<Winner>, ApiError> {
        let response = self
            .client
            .get(self.endpoints.leaderboard_snapshot(category))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let body: Value = decode_json(ensure_success(response).await?).await?;
        Ok(parse_snapshot(category, &body))
    }

    async fn post_envelope<B, R>(&self, url: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::from_transport)?;

        if text.trim().is_empty() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: "empty response body".to_string(),
            });
        }

        match serde_json::from_str::<R>(&text) {
            Ok(reply) => {
                tracing::debug!(url, status = status.as_u16(), "envelope reply");
                Ok(reply)
            }
            Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
                message: text,
            }),
        }
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: text,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response.text().await.map_err(ApiError::from_transport)?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::response::ResponseCode;
    use crate::chat::message::ChatMessage;
    use crate::coupon::claim::ClaimRequest;
    use crate::testing::FakeServer;

    fn client(server: &FakeServer) -> CoupongClient {
        CoupongClient::new(server.endpoints(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_id_check_envelope_on_error_status() {
        let server = FakeServer::start().await;
        let client = client(&server);

        let reply = client
            .id_check(&IdCheckRequest { id: "fresh".to_string() })
            .await
            .unwrap();
        assert_eq!(reply.code, ResponseCode::Success);

        // duplicate ids come back as 400 with the envelope
        let reply = client
            .id_check(&IdCheckRequest { id: "taken".to_string() })
            .await
            .unwrap();
        assert_eq!(reply.code, ResponseCode::DuplicateId);
    }

    #[tokio::test]
    async fn test_sign_in_and_token_decryption() {
        let server = FakeServer::start().await;
        let client = client(&server);

        let reply = client
            .sign_in(&SignInRequest {
                id: "alice".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        let issued = reply.issued_token().unwrap();
        assert_eq!(issued.expires_in_secs, 3600);

        let user = client.token_decryption(&issued.token).await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(!user.is_admin());

        let err = client.token_decryption("Bearer forged").await.unwrap_err();
        assert!(err.is_unauthorized());

        let reply = client
            .sign_in(&SignInRequest {
                id: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply.code, ResponseCode::SignInFail);
        assert!(reply.issued_token().is_none());
    }

    #[tokio::test]
    async fn test_coupon_events_and_claims() {
        let server = FakeServer::start().await;
        let client = client(&server);

        let listing = client.coupon_events().await.unwrap();
        assert_eq!(listing.events().len(), 2);

        let token = FakeServer::token_for("alice");
        let outcome = client
            .attempt_claim(&token, &ClaimRequest::new("PIZZA", "alice", 1))
            .await;
        assert_eq!(outcome, ClaimOutcome::Accepted);

        let outcome = client
            .attempt_claim(&token, &ClaimRequest::new("PIZZA", "alice", 2))
            .await;
        assert_eq!(outcome, ClaimOutcome::AlreadyEntered);

        let outcome = client
            .attempt_claim(&token, &ClaimRequest::new("HAMBURGER", "alice", 3))
            .await;
        assert_eq!(outcome, ClaimOutcome::Ended);

        let outcome = client
            .attempt_claim(&token, &ClaimRequest::new("CHICKEN", "alice", 4))
            .await;
        assert_eq!(outcome, ClaimOutcome::NotStarted);
    }

    #[tokio::test]
    async fn test_claim_without_server_is_request_failed() {
        let client = CoupongClient::new(
            Endpoints::new("http://127.0.0.1:9"),
            Duration::from_secs(2),
        )
        .unwrap();
        let outcome = client
            .attempt_claim("Bearer x", &ClaimRequest::new("PIZZA", "alice", 1))
            .await;
        assert_eq!(outcome, ClaimOutcome::RequestFailed);
    }

    #[tokio::test]
    async fn test_leaderboard_endpoints() {
        let server = FakeServer::start().await;
        let client = client(&server);

        let categories = client.leaderboard_categories().await.unwrap();
        assert_eq!(categories, vec!["PIZZA", "COFFEE"]);

        let winners = client.leaderboard_snapshot("PIZZA").await.unwrap();
        let ids: Vec<&str> = winners.iter().map(|w| w.user_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);

        assert!(client.leaderboard_snapshot("COFFEE").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtering_report() {
        let server = FakeServer::start().await;
        let client = client(&server);

        client
            .report_filtering(&FilterReport::success(ChatMessage::new("alice", "hi")))
            .await
            .unwrap();
        let err = client
            .report_filtering(&FilterReport::success(ChatMessage::new("alice", "badword")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(server.filter_reports().len(), 2);
    }
}
