//! Authenticator implementation
//!
//! Exchanges credentials for a session token at the login endpoint and
//! caches the token. Authentication failures are fatal and never retried;
//! credentials are assumed to be externally managed.

use super::provider::{CredentialProvider, Credentials};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A cached session token with optional expiry
#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn new(token: String, expires_in_seconds: Option<i64>) -> Self {
        Self {
            token,
            expires_at: expires_in_seconds.map(|s| Utc::now() + chrono::Duration::seconds(s)),
        }
    }

    /// Expired check with a 30 second buffer so a token is refreshed before
    /// an in-flight request can race its expiry.
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(30) >= expires_at,
            None => false,
        }
    }
}

/// Body returned by the login endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Handles exchanging credentials for a token and caching the result
pub struct Authenticator {
    login_url: String,
    provider: Arc<dyn CredentialProvider>,
    cached_token: RwLock<Option<CachedToken>>,
    http_client: Client,
}

impl Authenticator {
    /// Create an authenticator against the given login endpoint
    pub fn new(
        login_url: impl Into<String>,
        provider: Arc<dyn CredentialProvider>,
        http_client: Client,
    ) -> Self {
        Self {
            login_url: login_url.into(),
            provider,
            cached_token: RwLock::new(None),
            http_client,
        }
    }

    /// Get a valid token, logging in if necessary.
    pub async fn token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring the write lock (another task may have
        // logged in while we waited).
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.login().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);
        Ok(token_str)
    }

    /// Drop the cached token so the next request logs in again.
    pub async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }

    async fn login(&self) -> Result<CachedToken> {
        match self.provider.credentials().await? {
            Credentials::Token(token) => {
                tracing::debug!("using pre-issued API token");
                Ok(CachedToken::new(token, None))
            }
            Credentials::Login { username, password } => {
                tracing::debug!(username = %username, url = %self.login_url, "logging in");

                let response = self
                    .http_client
                    .post(&self.login_url)
                    .json(&serde_json::json!({
                        "username": username,
                        "password": password,
                    }))
                    .send()
                    .await
                    .map_err(|e| Error::network(format!("login request failed: {e}")))?;

                let status = response.status();
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(Error::auth(format!(
                        "login rejected with status {}",
                        status.as_u16()
                    )));
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::server(status.as_u16(), body));
                }

                let body: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::parse(format!("login response: {e}")))?;

                Ok(CachedToken::new(body.token, body.expires_in))
            }
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("login_url", &self.login_url)
            .finish_non_exhaustive()
    }
}
