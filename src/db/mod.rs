use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;
use tracing::warn;
use crate::models::{NewPromotionEntry, PriceObservation, PromotionEntry};

pub mod token_price;
pub mod free_game;
#[cfg(test)]
pub mod memory;

/// Append-only store of WoW token price observations
#[async_trait]
pub trait TokenPriceStore: Send + Sync {
    async fn insert_price_observation(
        &self,
        price: i64,
        observed_at: DateTime<Utc>,
    ) -> Result<PriceObservation, sqlx::Error>;

    async fn latest_price_observation(&self) -> Result<Option<PriceObservation>, sqlx::Error>;

    /// Observations with `observed_at >= since`, most recent first
    async fn price_observations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, sqlx::Error>;
}

/// Store of detected free game promotions
#[async_trait]
pub trait FreeGameStore: Send + Sync {
    async fn insert_promotion_entry(
        &self,
        entry: &NewPromotionEntry,
    ) -> Result<PromotionEntry, sqlx::Error>;

    /// Entries whose promotional window contains the current time
    async fn active_promotion_entries(&self) -> Result<Vec<PromotionEntry>, sqlx::Error>;
}

/// MySQL-backed implementation of both stores
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenPriceStore for MySqlStore {
    async fn insert_price_observation(
        &self,
        price: i64,
        observed_at: DateTime<Utc>,
    ) -> Result<PriceObservation, sqlx::Error> {
        token_price::add_token_price(&self.pool, price, observed_at).await
    }

    async fn latest_price_observation(&self) -> Result<Option<PriceObservation>, sqlx::Error> {
        token_price::get_latest_token_price(&self.pool).await
    }

    async fn price_observations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, sqlx::Error> {
        token_price::get_token_prices_since(&self.pool, since).await
    }
}

#[async_trait]
impl FreeGameStore for MySqlStore {
    async fn insert_promotion_entry(
        &self,
        entry: &NewPromotionEntry,
    ) -> Result<PromotionEntry, sqlx::Error> {
        free_game::add_free_game(&self.pool, entry).await
    }

    async fn active_promotion_entries(&self) -> Result<Vec<PromotionEntry>, sqlx::Error> {
        free_game::get_current_free_games(&self.pool, Utc::now()).await
    }
}

/// Initialize the MySQL connection pool and create tables
pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPool::connect(database_url).await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Split a schema file into individual statements
fn split_statements(sql_content: &str) -> Vec<&str> {
    sql_content
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Read and execute SQL file for creating tables
async fn execute_sql_file(pool: &MySqlPool, file_path: &str) -> Result<(), String> {
    let sql_content = std::fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to read {}: {}", file_path, e))?;

    for statement in split_statements(&sql_content) {
        if let Err(e) = sqlx::raw_sql(statement).execute(pool).await {
            warn!("Schema statement failed (continuing): {}", e);
        }
    }

    Ok(())
}

/// Create all database tables
async fn create_tables(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    if let Err(e) = execute_sql_file(pool, "migrations/create_tables.sql").await {
        warn!("Failed to create tables: {}", e);
    }

    Ok(())
}
