//! Token price models

use chrono::{DateTime, Utc};

/// A single observed WoW token price, in gold
///
/// `id` is assigned by the store and grows with insertion order, so it
/// breaks ties between observations sharing the same timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceObservation {
    pub id: i64,
    pub observed_at: DateTime<Utc>,
    pub price: i64,
}
