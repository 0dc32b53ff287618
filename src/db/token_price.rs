use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;
use crate::models::PriceObservation;

type PriceRow = (i64, DateTime<Utc>, i64);

fn into_observation((id, observed_at, price): PriceRow) -> PriceObservation {
    PriceObservation { id, observed_at, price }
}

/// Record a new token price observation
pub async fn add_token_price(
    pool: &MySqlPool,
    price: i64,
    observed_at: DateTime<Utc>,
) -> Result<PriceObservation, sqlx::Error> {
    let result = sqlx::query("INSERT INTO wow_token_prices (updated, price) VALUES (?, ?)")
        .bind(observed_at)
        .bind(price)
        .execute(pool)
        .await?;

    Ok(PriceObservation {
        id: result.last_insert_id() as i64,
        observed_at,
        price,
    })
}

/// Get the most recently inserted token price
pub async fn get_latest_token_price(pool: &MySqlPool) -> Result<Option<PriceObservation>, sqlx::Error> {
    let row = sqlx::query_as::<_, PriceRow>(
        "SELECT id, updated, price FROM wow_token_prices ORDER BY id DESC LIMIT 1"
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(into_observation))
}

/// Get all token prices observed at or after `since`, newest first
pub async fn get_token_prices_since(
    pool: &MySqlPool,
    since: DateTime<Utc>,
) -> Result<Vec<PriceObservation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PriceRow>(
        "SELECT id, updated, price FROM wow_token_prices WHERE updated >= ? ORDER BY id DESC"
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(into_observation).collect())
}
