//! Access token acquisition for the feature service.
//!
//! Uses the OAuth2 `client_credentials` grant and caches the resulting token
//! until it is close to expiry, so a burst of UI requests costs one token
//! call instead of one per request.

use std::future::Future;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, ServlineError};

use super::types::TokenResponse;

/// Seconds before expiry at which a cached token is replaced.
pub const REFRESH_BUFFER_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7200;

/// An access token and its absolute expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: i64,
}

impl AccessToken {
    /// Whether the token expires within `secs` seconds of `now`.
    pub fn expires_within(&self, secs: i64, now: i64) -> bool {
        self.expires_at - now <= secs
    }
}

/// Application credentials for the `client_credentials` grant.
#[derive(Clone)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Request a fresh token from the token endpoint.
pub async fn request_token(
    http: &reqwest::Client,
    creds: &ClientCredentials,
) -> Result<AccessToken> {
    let params = [
        ("grant_type", "client_credentials"),
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.as_str()),
        ("f", "json"),
    ];

    let resp = http
        .post(&creds.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| ServlineError::Auth(format!("Token request failed: {}", e)))?;

    read_token_response(resp, chrono::Utc::now().timestamp()).await
}

/// Read a token endpoint response body and parse it.
async fn read_token_response(resp: reqwest::Response, now: i64) -> Result<AccessToken> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ServlineError::Auth(format!("Failed to read token response: {}", e)))?;

    parse_token_response(status, &body, now)
}

/// Turn a token endpoint response into an [`AccessToken`].
pub fn parse_token_response(
    status: reqwest::StatusCode,
    body: &str,
    now: i64,
) -> Result<AccessToken> {
    if !status.is_success() {
        return Err(ServlineError::Auth(format!(
            "Token endpoint returned HTTP {}",
            status
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ServlineError::Auth(format!("Failed to parse token response: {}", e)))?;

    if let Some(err) = parsed.error {
        return Err(ServlineError::Auth(err.describe()));
    }

    let token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServlineError::Auth("Token response has no access_token".to_string()))?;

    Ok(AccessToken {
        token,
        expires_at: now + parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
    })
}

/// Holds the most recent token and refreshes it on demand.
#[derive(Debug, Default)]
pub struct TokenCache {
    current: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a cached token, or call `fetch` to obtain a new one.
    ///
    /// The write lock is held across `fetch`, so concurrent callers wait for
    /// a single refresh instead of each minting their own token.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        let now = chrono::Utc::now().timestamp();

        {
            let cached = self.current.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.expires_within(REFRESH_BUFFER_SECS, now) {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut slot = self.current.write().await;
        if let Some(token) = slot.as_ref() {
            if !token.expires_within(REFRESH_BUFFER_SECS, now) {
                return Ok(token.token.clone());
            }
            debug!("Cached access token expiring soon, refreshing");
        }

        match fetch().await {
            Ok(fresh) => {
                info!(expires_at = fresh.expires_at, "Obtained feature service token");
                let token = fresh.token.clone();
                *slot = Some(fresh);
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Feature service token request failed");
                *slot = None;
                Err(e)
            }
        }
    }

    /// Drop the cached token, e.g. after the service reports it invalid.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
