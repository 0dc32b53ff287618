use std::sync::Arc;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::api::blizzard::{ClientCredentials, TokenExchange};
use crate::api::ApiError;

/// A bearer token and the unix time (seconds) it expires at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub value: String,
    pub expires_at: i64,
}

impl AuthToken {
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.value.is_empty() && now < self.expires_at
    }
}

/// In-memory bearer token cache
///
/// The lock is held across a refresh so concurrent callers wait for one
/// exchange instead of racing. A failed refresh leaves the previous token
/// in place.
pub struct AuthTokenCache {
    exchange: Arc<dyn TokenExchange>,
    token: Mutex<Option<AuthToken>>,
}

impl AuthTokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            token: Mutex::new(None),
        }
    }

    /// Seed the cache with an existing token
    pub fn with_token(exchange: Arc<dyn TokenExchange>, token: AuthToken) -> Self {
        Self {
            exchange,
            token: Mutex::new(Some(token)),
        }
    }

    /// Return the cached token, refreshing it first if it has expired
    pub async fn get_token(&self, credentials: &ClientCredentials) -> Result<String, ApiError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(now)) {
            debug!("Using cached auth token (expires at {})", token.expires_at);
            return Ok(token.value.clone());
        }

        info!("Requesting a new auth token");
        let response = self.exchange.exchange(credentials).await?;
        if response.access_token.is_empty() {
            return Err(ApiError::DeserializationError("Auth token response had an empty access_token".to_string()));
        }

        let token = AuthToken {
            value: response.access_token,
            expires_at: Utc::now().timestamp() + response.expires_in,
        };
        let value = token.value.clone();
        *cached = Some(token);

        Ok(value)
    }

    /// Snapshot of the cached token
    pub async fn current(&self) -> Option<AuthToken> {
        self.token.lock().await.clone()
    }
}
