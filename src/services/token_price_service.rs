use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::api::blizzard::{ClientCredentials, TokenPriceFeed};
use crate::api::ApiError;
use crate::db::TokenPriceStore;
use crate::models::PriceObservation;
use crate::services::auth_token_cache::AuthTokenCache;
use crate::utils::errors::FetchError;

/// Upstream reports prices in copper; 1 gold = 100 silver = 10,000 copper
pub const PRICE_SCALE: i64 = 100 * 100;

/// Minutes before a stored price is considered stale
pub const GRACE_PERIOD_MINUTES: i64 = 20;

/// What to do when a freshly fetched price cannot be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// Log the failure and return the fetched price anyway
    #[default]
    ContinueOnPersistError,
    /// Fail the fetch with `FetchError::Persistence`
    FailOnPersistError,
}

/// Divide a raw upstream price by its scale factor
pub fn normalize_price(raw: i64, scale: i64) -> i64 {
    raw / scale
}

/// Convert an upstream millisecond epoch into a timestamp
pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>, ApiError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| ApiError::DeserializationError(format!("Invalid timestamp: {}", millis)))
}

/// Cache-aside fetcher for the WoW token price
pub struct TokenPriceService {
    store: Arc<dyn TokenPriceStore>,
    feed: Arc<dyn TokenPriceFeed>,
    tokens: AuthTokenCache,
    credentials: ClientCredentials,
    grace_period: Duration,
    persist_policy: PersistPolicy,
    // Serializes cache misses so concurrent callers issue one upstream call
    refresh_lock: Mutex<()>,
}

impl TokenPriceService {
    pub fn new(
        store: Arc<dyn TokenPriceStore>,
        feed: Arc<dyn TokenPriceFeed>,
        tokens: AuthTokenCache,
        credentials: ClientCredentials,
        persist_policy: PersistPolicy,
    ) -> Self {
        Self {
            store,
            feed,
            tokens,
            credentials,
            grace_period: Duration::minutes(GRACE_PERIOD_MINUTES),
            persist_policy,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Most recent stored observation if it is still inside the grace period.
    /// Store failures count as a miss.
    async fn fresh_cached(&self) -> Option<PriceObservation> {
        match self.store.latest_price_observation().await {
            Ok(Some(observation)) if Utc::now() - observation.observed_at < self.grace_period => {
                Some(observation)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to get latest token price from the database. Falling back to API request: {}", e);
                None
            }
        }
    }

    /// Return the current token price, from the store when fresh, otherwise
    /// from the upstream API (and stored)
    pub async fn fetch_token_price(&self) -> Result<PriceObservation, FetchError> {
        if let Some(observation) = self.fresh_cached().await {
            debug!("WoW Token: we have the latest result in our database, returning it");
            return Ok(observation);
        }

        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let guard = self.refresh_lock.lock().await;
                // Another caller refreshed while we waited
                if let Some(observation) = self.fresh_cached().await {
                    debug!("WoW Token: price refreshed by a concurrent fetch, returning it");
                    return Ok(observation);
                }
                guard
            }
        };

        info!("Fetching latest WoW token price");
        let token = self.tokens.get_token(&self.credentials).await?;
        let response = self.feed.fetch_price(&token).await?;

        let price = normalize_price(response.price, PRICE_SCALE);
        let observed_at = from_epoch_millis(response.last_updated_timestamp)?;

        match self.store.insert_price_observation(price, observed_at).await {
            Ok(observation) => {
                info!("Fetched latest token price: {} gold", observation.price);
                Ok(observation)
            }
            Err(e) => match self.persist_policy {
                PersistPolicy::ContinueOnPersistError => {
                    warn!("WoW Token: failed to add new price to database, returning it anyway: {}", e);
                    Ok(PriceObservation { id: 0, observed_at, price })
                }
                PersistPolicy::FailOnPersistError => Err(FetchError::Persistence(e)),
            },
        }
    }
}
