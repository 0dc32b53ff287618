use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;
use sqlx::Row;
use crate::models::{NewPromotionEntry, PromotionEntry};

/// Store a newly detected free game
pub async fn add_free_game(
    pool: &MySqlPool,
    entry: &NewPromotionEntry,
) -> Result<PromotionEntry, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO egs_free_games (store_id, title, description, url, thumbnail_url, start_date, end_date) VALUES (?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&entry.store_id)
    .bind(&entry.title)
    .bind(&entry.description)
    .bind(&entry.url)
    .bind(&entry.thumbnail_url)
    .bind(entry.active_from)
    .bind(entry.active_until)
    .execute(pool)
    .await?;

    Ok(PromotionEntry {
        id: result.last_insert_id() as i64,
        store_id: entry.store_id.clone(),
        title: entry.title.clone(),
        description: entry.description.clone(),
        url: entry.url.clone(),
        thumbnail_url: entry.thumbnail_url.clone(),
        active_from: entry.active_from,
        active_until: entry.active_until,
    })
}

/// Get free games whose promotion window contains `now`
pub async fn get_current_free_games(
    pool: &MySqlPool,
    now: DateTime<Utc>,
) -> Result<Vec<PromotionEntry>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, store_id, title, description, url, thumbnail_url, start_date, end_date FROM egs_free_games WHERE start_date <= ? AND end_date >= ? ORDER BY id DESC"
    )
    .bind(now)
    .bind(now)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(PromotionEntry {
                id: row.try_get("id")?,
                store_id: row.try_get("store_id")?,
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                url: row.try_get("url")?,
                thumbnail_url: row.try_get("thumbnail_url")?,
                active_from: row.try_get("start_date")?,
                active_until: row.try_get("end_date")?,
            })
        })
        .collect()
}
