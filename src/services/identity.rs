//! Hosted identity service client — session lookup, code exchange, sign-out.
//!
//! DESIGN
//! ======
//! All authentication state lives in the hosted identity service; this module
//! only observes it. Handlers depend on the `IdentityProvider` trait so tests
//! can swap the HTTP client for a mock, and so the rest of the crate never
//! touches ambient auth globals.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

/// Outbound request timeout. The upstream flow had none; a hung identity
/// service must not hold page navigation hostage.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// An authenticated principal as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// A live session: proof of authentication plus the identity it belongs to.
/// The access token is the value carried in the session cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub identity: Identity,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity service unreachable: {0}")]
    Unreachable(String),
    #[error("code exchange rejected: {0}")]
    Exchange(String),
    #[error("identity service error: {0}")]
    Service(String),
}

/// Operations the auth flow consumes from the identity backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validity check for an access token. `Ok(None)` means expired or
    /// revoked; the backend renews the token server-side where supported.
    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError>;

    /// Exchange a one-time authorization code for a session. Codes are
    /// single-use by the backend's contract, so there is no retry.
    async fn exchange_code(&self, code: &str) -> Result<Session, IdentityError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

/// Identity service configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

impl IdentityConfig {
    /// Load from `AUTH_SERVICE_URL` and `AUTH_SERVICE_KEY`.
    /// Returns `None` if either is missing (login will be disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("AUTH_SERVICE_URL").ok()?;
        let api_key = std::env::var("AUTH_SERVICE_KEY").ok()?;
        Some(Self { base_url: normalize_base_url(&base_url), api_key })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

fn parse_user(body: &str) -> Result<Identity, IdentityError> {
    let user: UserResponse = serde_json::from_str(body)
        .map_err(|_| IdentityError::Service(format!("unexpected user response: {body}")))?;
    Ok(Identity { id: user.id, email: user.email })
}

fn parse_token(body: &str) -> Result<Session, IdentityError> {
    let token: TokenResponse = serde_json::from_str(body)
        .map_err(|_| IdentityError::Exchange(format!("unexpected token response: {body}")))?;
    Ok(Session {
        access_token: token.access_token,
        identity: Identity { id: token.user.id, email: token.user.email },
    })
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Production `IdentityProvider` speaking HTTP to the hosted service.
pub struct HostedIdentity {
    config: IdentityConfig,
    http: reqwest::Client,
}

impl HostedIdentity {
    /// Build the client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::Service(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentity {
    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        let resp = self
            .http
            .get(format!("{}/v1/user", self.config.base_url))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Service(format!("{status}: {body}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;
        let identity = parse_user(&body)?;
        Ok(Some(Session { access_token: access_token.to_owned(), identity }))
    }

    async fn exchange_code(&self, code: &str) -> Result<Session, IdentityError> {
        let resp = self
            .http
            .post(format!("{}/v1/token?grant_type=authorization_code", self.config.base_url))
            .header("apikey", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Exchange(format!("{status}: {body}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;
        parse_token(&body)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .post(format!("{}/v1/logout", self.config.base_url))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let status = resp.status();
        // An already-expired token is a successful sign-out from our side.
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(IdentityError::Service(status.to_string()))
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
