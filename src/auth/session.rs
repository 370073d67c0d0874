//! Signed-in session on top of the cookie jar

use chrono::Utc;
use thiserror::Error;

use super::cookie::{CookieError, CookieJar, ACCESS_TOKEN};
use super::response::{AuthStep, Feedback};
use crate::api::client::CoupongClient;
use crate::api::dto::{SignInRequest, UserInfo};
use crate::api::error::ApiError;

pub struct Session<'a> {
    client: &'a CoupongClient,
    jar: CookieJar,
}

impl<'a> Session<'a> {
    pub fn new(client: &'a CoupongClient, jar: CookieJar) -> Self {
        Self { client, jar }
    }

    pub fn token(&self) -> Option<&str> {
        self.jar.get(ACCESS_TOKEN)
    }

    /// Post credentials; on success the token is stored until it expires.
    /// Rejected credentials come back as `Ok` with the feedback to show.
    pub async fn sign_in(&mut self, request: &SignInRequest) -> Result<Feedback, SessionError> {
        let reply = self.client.sign_in(request).await?;
        let feedback = AuthStep::SignIn.feedback(&reply.code);

        if let Some(issued) = reply.issued_token() {
            let expires = issued.expires_at(Utc::now()).ok_or_else(|| {
                ApiError::Decode(format!("token lifetime of {} seconds", issued.expires_in_secs))
            })?;
            self.jar.set(ACCESS_TOKEN, &issued.token, Some(expires))?;
            tracing::info!(user = %request.id, expires = %expires, "signed in");
        } else {
            tracing::warn!(user = %request.id, code = reply.code.as_str(), "sign-in rejected");
        }
        Ok(feedback)
    }

    /// Introspect the stored token. Without one no request is made.
    pub async fn current_user(&self) -> Result<UserInfo, SessionError> {
        let token = self.token().ok_or(SessionError::NotSignedIn)?;
        let user = self.client.token_decryption(token).await?;
        tracing::debug!(user = %user.username, role = ?user.role, "token decrypted");
        Ok(user)
    }

    pub async fn require_admin(&self) -> Result<UserInfo, SessionError> {
        let user = self.current_user().await?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(SessionError::Forbidden(user.username))
        }
    }

    /// Returns whether a token was stored
    pub fn sign_out(&mut self) -> Result<bool, SessionError> {
        Ok(self.jar.remove(ACCESS_TOKEN)?)
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("{0} is not an administrator")]
    Forbidden(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cookie(#[from] CookieError),
}

impl SessionError {
    /// The browser sends the user back to sign-in for all of these
    pub fn needs_sign_in(&self) -> bool {
        match self {
            SessionError::NotSignedIn | SessionError::Forbidden(_) => true,
            SessionError::Api(e) => e.is_unauthorized(),
            SessionError::Cookie(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoints::Endpoints;
    use crate::testing::FakeServer;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sign_in_request(id: &str, password: &str) -> SignInRequest {
        SignInRequest {
            id: id.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_stores_token() {
        let server = FakeServer::start().await;
        let client = CoupongClient::new(server.endpoints(), Duration::from_secs(5)).unwrap();
        let dir = TempDir::new().unwrap();

        let mut session = Session::new(&client, CookieJar::open(dir.path()).unwrap());
        let feedback = session
            .sign_in(&sign_in_request("alice", "secret123"))
            .await
            .unwrap();
        assert!(feedback.ok);
        assert_eq!(session.token(), Some("Bearer token-alice"));

        // a fresh session on the same jar is still signed in
        let session = Session::new(&client, CookieJar::open(dir.path()).unwrap());
        let user = session.current_user().await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(matches!(
            session.require_admin().await,
            Err(SessionError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_sign_in_stores_nothing() {
        let server = FakeServer::start().await;
        let client = CoupongClient::new(server.endpoints(), Duration::from_secs(5)).unwrap();
        let dir = TempDir::new().unwrap();

        let mut session = Session::new(&client, CookieJar::open(dir.path()).unwrap());
        let feedback = session
            .sign_in(&sign_in_request("alice", "nope"))
            .await
            .unwrap();
        assert!(!feedback.ok);
        assert_eq!(feedback.message, "Sign-in details do not match.");
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn test_unusable_token_lifetime_is_refused() {
        let server = FakeServer::start().await;
        let client = CoupongClient::new(server.endpoints(), Duration::from_secs(5)).unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(&client, CookieJar::open(dir.path()).unwrap());

        for id in [FakeServer::ENDLESS_TOKEN_USER, FakeServer::EXPIRED_TOKEN_USER] {
            let err = session
                .sign_in(&sign_in_request(id, "secret123"))
                .await
                .unwrap_err();
            assert!(matches!(err, SessionError::Api(ApiError::Decode(_))));
            assert_eq!(session.token(), None);
        }
    }

    #[tokio::test]
    async fn test_admin_and_sign_out() {
        let server = FakeServer::start().await;
        let client = CoupongClient::new(server.endpoints(), Duration::from_secs(5)).unwrap();
        let dir = TempDir::new().unwrap();

        let mut session = Session::new(&client, CookieJar::open(dir.path()).unwrap());
        session
            .sign_in(&sign_in_request("root", "secret123"))
            .await
            .unwrap();
        assert_eq!(session.require_admin().await.unwrap().username, "root");

        assert!(session.sign_out().unwrap());
        let err = session.current_user().await.unwrap_err();
        assert!(matches!(err, SessionError::NotSignedIn));
        assert!(err.needs_sign_in());
    }

    #[tokio::test]
    async fn test_current_user_without_token_makes_no_request() {
        // nothing listens on this port; any request would fail with Unavailable
        let client =
            CoupongClient::new(Endpoints::new("http://127.0.0.1:9"), Duration::from_secs(1)).unwrap();
        let dir = TempDir::new().unwrap();
        let session = Session::new(&client, CookieJar::open(dir.path()).unwrap());
        assert!(matches!(
            session.current_user().await,
            Err(SessionError::NotSignedIn)
        ));
    }
}
