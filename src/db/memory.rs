//! In-memory stores for service tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use super::{FreeGameStore, TokenPriceStore};
use crate::models::{NewPromotionEntry, PriceObservation, PromotionEntry};

#[derive(Default)]
pub struct MemoryStore {
    prices: Mutex<Vec<PriceObservation>>,
    games: Mutex<Vec<PromotionEntry>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub price_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(points: &[(DateTime<Utc>, i64)]) -> Self {
        let store = Self::new();
        {
            let mut prices = store.prices.lock().unwrap();
            for (i, (observed_at, price)) in points.iter().enumerate() {
                prices.push(PriceObservation { id: i as i64 + 1, observed_at: *observed_at, price: *price });
            }
        }
        store
    }

    pub fn prices(&self) -> Vec<PriceObservation> {
        self.prices.lock().unwrap().clone()
    }

    pub fn games(&self) -> Vec<PromotionEntry> {
        self.games.lock().unwrap().clone()
    }

    fn check_read(&self) -> Result<(), sqlx::Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl TokenPriceStore for MemoryStore {
    async fn insert_price_observation(
        &self,
        price: i64,
        observed_at: DateTime<Utc>,
    ) -> Result<PriceObservation, sqlx::Error> {
        self.check_write()?;
        let mut prices = self.prices.lock().unwrap();
        let observation = PriceObservation { id: prices.len() as i64 + 1, observed_at, price };
        prices.push(observation.clone());
        Ok(observation)
    }

    async fn latest_price_observation(&self) -> Result<Option<PriceObservation>, sqlx::Error> {
        self.price_reads.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        Ok(self.prices.lock().unwrap().last().cloned())
    }

    async fn price_observations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, sqlx::Error> {
        self.check_read()?;
        let prices = self.prices.lock().unwrap();
        Ok(prices.iter().rev().filter(|p| p.observed_at >= since).cloned().collect())
    }
}

#[async_trait]
impl FreeGameStore for MemoryStore {
    async fn insert_promotion_entry(
        &self,
        entry: &NewPromotionEntry,
    ) -> Result<PromotionEntry, sqlx::Error> {
        self.check_write()?;
        let mut games = self.games.lock().unwrap();
        let stored = PromotionEntry {
            id: games.len() as i64 + 1,
            store_id: entry.store_id.clone(),
            title: entry.title.clone(),
            description: entry.description.clone(),
            url: entry.url.clone(),
            thumbnail_url: entry.thumbnail_url.clone(),
            active_from: entry.active_from,
            active_until: entry.active_until,
        };
        games.push(stored.clone());
        Ok(stored)
    }

    async fn active_promotion_entries(&self) -> Result<Vec<PromotionEntry>, sqlx::Error> {
        self.check_read()?;
        let now = Utc::now();
        let games = self.games.lock().unwrap();
        Ok(games
            .iter()
            .rev()
            .filter(|g| g.active_from <= now && now <= g.active_until)
            .cloned()
            .collect())
    }
}
