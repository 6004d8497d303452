//! Session context over the hosted auth service.
//!
//! The auth protocol itself (password grant, token issuance, revocation)
//! belongs to the hosted service. This module keeps the process-wide
//! session behind a lock and is injected where needed rather than read
//! from globals.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Errors from the auth service.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not signed in")]
    NotSignedIn,
}

/// Configuration for [`SessionContext`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Root of the hosted service (the part before `/auth/v1`).
    pub base_url: Url,

    /// Public API key, sent with every auth request.
    pub api_key: String,

    pub timeout: Duration,
}

impl AuthConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// An access token and the account it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

/// Process-wide session holder, lazily populated on sign-in and cleared on
/// sign-out.
pub struct SessionContext {
    client: Client,
    config: AuthConfig,
    session: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
        })
    }

    /// Construct with an already-established session, for serving against
    /// a pre-issued token.
    pub fn with_session(config: AuthConfig, session: Session) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            session: RwLock::new(Some(session)),
        })
    }

    fn endpoint(&self, segments: &str) -> Result<Url, AuthError> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/auth/v1/{}", base, segments))
            .map_err(|e| AuthError::InvalidUrl(e.to_string()))
    }

    async fn token_request(&self, url: Url, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Service { status, message });
        }

        let session: Session = response.json().await?;
        *self.session.write().await = Some(session.clone());
        debug!("Signed in as {}", session.user.id);
        Ok(session)
    }

    /// Create an account and store the returned session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.endpoint("signup")?;
        self.token_request(url, email, password).await
    }

    /// Password-grant sign-in; the session is stored for the process.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.endpoint("token?grant_type=password")?;
        self.token_request(url, email, password).await
    }

    /// Clear the local session. Remote token revocation is best-effort:
    /// the local session is gone either way.
    pub async fn sign_out(&self) {
        let session = self.session.write().await.take();

        let Some(session) = session else { return };
        let url = match self.endpoint("logout") {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping remote sign-out: {}", e);
                return;
            }
        };

        let result = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        if let Err(e) = result {
            warn!("Remote sign-out failed (local session cleared): {}", e);
        }
    }

    /// The current session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// The current session, or `NotSignedIn`.
    pub async fn require(&self) -> Result<Session, AuthError> {
        self.current().await.ok_or(AuthError::NotSignedIn)
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SessionContext {
        SessionContext::new(AuthConfig::new(
            Url::parse("http://localhost:54321").unwrap(),
            "anon-key",
        ))
        .unwrap()
    }

    fn session() -> Session {
        Session {
            access_token: "jwt".to_string(),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some("player@example.com".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_starts_signed_out() {
        let ctx = context();
        assert!(!ctx.is_signed_in().await);
        assert!(matches!(ctx.require().await, Err(AuthError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_without_network() {
        let ctx = context();
        *ctx.session.write().await = Some(session());
        assert!(ctx.is_signed_in().await);

        // The logout endpoint is unreachable in tests; the local session
        // must be cleared regardless.
        ctx.sign_out().await;
        assert!(!ctx.is_signed_in().await);
    }

    #[tokio::test]
    async fn test_sign_out_when_signed_out_is_noop() {
        let ctx = context();
        ctx.sign_out().await;
        assert!(!ctx.is_signed_in().await);
    }

    #[test]
    fn test_endpoint_building() {
        let ctx = context();
        assert_eq!(
            ctx.endpoint("signup").unwrap().as_str(),
            "http://localhost:54321/auth/v1/signup"
        );
        assert_eq!(
            ctx.endpoint("token?grant_type=password").unwrap().as_str(),
            "http://localhost:54321/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_session_decodes_service_response() {
        let json = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {
                "id": "5f8f8c44-9d9b-4f9e-8a3e-111122223333",
                "email": "player@example.com",
                "role": "authenticated"
            }
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.user.email.as_deref(), Some("player@example.com"));
    }
}
