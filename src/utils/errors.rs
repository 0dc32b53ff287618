use thiserror::Error;
use crate::api::ApiError;

/// Errors from the cache-aside token price fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Errors from chart requests
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Invalid unit type \"{0}\" given")]
    InvalidUnit(String),
    #[error("Invalid period \"{0}\" given")]
    InvalidPeriod(String),
    #[error("Must be between {min} to {max} {unit} (got {period})")]
    PeriodOutOfRange {
        unit: &'static str,
        period: i64,
        min: u32,
        max: u32,
    },
    #[error("Not enough price history to generate chart ({0} point(s) found, need at least 2)")]
    InsufficientData(usize),
    #[error("Failed to get token prices from database: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("Failed to render chart: {0}")]
    Render(String),
}

impl ChartError {
    /// Caller supplied a bad unit or period
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChartError::InvalidUnit(_) | ChartError::InvalidPeriod(_) | ChartError::PeriodOutOfRange { .. }
        )
    }
}

/// Errors from a free games deduplication pass
#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),
    #[error("Failed to load current free games: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Extract clean error message from database error strings
///
/// Removes technical error codes and prefixes like:
/// "error returned from database: 1146 (42S02): Table 'bot.wow_token_prices' doesn't exist"
///
/// Returns only the meaningful error message:
/// "Table 'bot.wow_token_prices' doesn't exist"
pub fn extract_clean_error(error_msg: &str) -> String {
    if error_msg.contains("error returned from database:") {
        if let Some(last_colon) = error_msg.rfind(": ") {
            error_msg[last_colon + 2..].trim().to_string()
        } else {
            error_msg.to_string()
        }
    } else {
        error_msg.to_string()
    }
}
