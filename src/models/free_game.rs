//! Free game promotion models

use chrono::{DateTime, Utc};

/// A promotion entry as recorded in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionEntry {
    pub id: i64,
    pub store_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_url: String,
    pub active_from: DateTime<Utc>,
    pub active_until: DateTime<Utc>,
}

/// A promotion entry detected upstream, before the store assigns it an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromotionEntry {
    pub store_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_url: String,
    pub active_from: DateTime<Utc>,
    pub active_until: DateTime<Utc>,
}

impl NewPromotionEntry {
    /// Natural key used for deduplication: (store id, title)
    pub fn natural_key(&self) -> (&str, &str) {
        (&self.store_id, &self.title)
    }
}

impl PromotionEntry {
    pub fn natural_key(&self) -> (&str, &str) {
        (&self.store_id, &self.title)
    }
}
