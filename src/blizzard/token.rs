//! OAuth client-credential token management.
//!
//! One [`TokenManager`] is built at startup and shared by every resolution
//! call. It hands out the cached bearer token while it is fresh and performs
//! a single client-credential exchange when it is missing or expired.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::common::error::AuthError;

/// Subtracted from the provider-declared lifetime so a token never expires
/// mid-request.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A bearer credential and the instant it stops being usable.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: Instant,
}

impl BearerToken {
    /// Build a token from a declared lifetime, applying [`EXPIRY_MARGIN`].
    pub fn from_lifetime(value: String, declared: Duration, now: Instant) -> Self {
        Self {
            value,
            expires_at: now + declared.saturating_sub(EXPIRY_MARGIN),
        }
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body of a successful `POST /token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: u64,
}

/// Something that can trade client credentials for a token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<TokenGrant, AuthError>;
}

/// Client-credential grant against the Battle.net OAuth endpoint.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenExchange for ClientCredentials {
    async fn exchange(&self) -> Result<TokenGrant, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(AuthError::Transport)?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(AuthError::Malformed)
    }
}

/// Owns the cached bearer token.
///
/// Reads of a fresh token only take the read side of the cache lock. Refreshes
/// are serialized by `refresh`, and a caller that waited on it re-checks the
/// cache before exchanging, so concurrent callers that all saw an expired
/// token trigger exactly one exchange.
pub struct TokenManager {
    exchange: Box<dyn TokenExchange>,
    cached: RwLock<Option<BearerToken>>,
    refresh: Mutex<()>,
}

impl TokenManager {
    pub fn new(exchange: impl TokenExchange + 'static) -> Self {
        Self {
            exchange: Box::new(exchange),
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return a token that is valid right now, refreshing if needed.
    ///
    /// A failed refresh leaves the previously cached token in place.
    pub async fn get_valid_token(&self) -> Result<BearerToken, AuthError> {
        if let Some(token) = self.fresh_cached().await {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.fresh_cached().await {
            debug!("Reusing token refreshed by a concurrent caller");
            return Ok(token);
        }

        debug!("Requesting new Blizzard API token");
        let grant = self.exchange.exchange().await.map_err(|e| {
            warn!("Blizzard token exchange failed: {}", e);
            e
        })?;

        if !grant.token_type.is_empty() && !grant.token_type.eq_ignore_ascii_case("bearer") {
            warn!("Unexpected token type '{}', using it as a bearer token", grant.token_type);
        }

        let token = BearerToken::from_lifetime(
            grant.access_token,
            Duration::from_secs(grant.expires_in),
            Instant::now(),
        );
        info!(
            "Obtained Blizzard API token ({}s lifetime)",
            grant.expires_in
        );

        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    async fn fresh_cached(&self) -> Option<BearerToken> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|token| token.is_valid_at(Instant::now()))
            .cloned()
    }
}
