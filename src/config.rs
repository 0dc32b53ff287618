use std::time::Duration;
use thiserror::Error;
use crate::services::{NotifyPolicy, PersistPolicy};

const DEFAULT_AUTH_TOKEN_URL: &str = "https://us.battle.net/oauth/token?grant_type=client_credentials";
const DEFAULT_TOKEN_PRICE_URL: &str = "https://us.api.blizzard.com/data/wow/token/index?namespace=dynamic-us";
const DEFAULT_PRODUCT_BASE_URL: &str = "https://www.epicgames.com/store/en-US/product/";
const DEFAULT_FREE_GAMES_API_URL: &str =
    "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions?locale=en-US&country=US&allowCountries=US";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_token: String,
    pub database_url: String,
    pub blizzard_client_id: String,
    pub blizzard_client_secret: String,
    pub deals_channel_id: u64,
    pub auth_token_url: String,
    pub token_price_url: String,
    pub product_base_url: String,
    pub free_games_api_url: String,
    pub http_host: String,
    pub http_port: u16,
    pub wow_token_interval: Duration,
    pub free_games_interval: Duration,
    pub persist_policy: PersistPolicy,
    pub notify_policy: NotifyPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let deals_channel_id = parse_number("DEALS_CHANNEL_ID", required("DEALS_CHANNEL_ID")?)?;
        if deals_channel_id == 0 {
            return Err(ConfigError::Invalid { key: "DEALS_CHANNEL_ID", value: "0".to_string() });
        }

        Ok(Self {
            discord_token: required("DISCORD_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            blizzard_client_id: required("BLIZZARD_CLIENT_ID")?,
            blizzard_client_secret: required("BLIZZARD_CLIENT_SECRET")?,
            deals_channel_id,
            auth_token_url: or_default("BLIZZARD_AUTH_TOKEN_URL", DEFAULT_AUTH_TOKEN_URL),
            token_price_url: or_default("BLIZZARD_TOKEN_PRICE_URL", DEFAULT_TOKEN_PRICE_URL),
            product_base_url: or_default("EGS_PRODUCT_BASE_URL", DEFAULT_PRODUCT_BASE_URL),
            free_games_api_url: or_default("EGS_FREE_GAMES_API_URL", DEFAULT_FREE_GAMES_API_URL),
            http_host: or_default("HTTP_LISTEN_HOST", "127.0.0.1"),
            http_port: parse_number("HTTP_LISTEN_PORT", or_default("HTTP_LISTEN_PORT", "5000"))?,
            wow_token_interval: minutes("WOW_TOKEN_INTERVAL_MINUTES", or_default("WOW_TOKEN_INTERVAL_MINUTES", "5"))?,
            free_games_interval: minutes("FREE_GAMES_INTERVAL_MINUTES", or_default("FREE_GAMES_INTERVAL_MINUTES", "60"))?,
            persist_policy: match or_default("TOKEN_PERSIST_POLICY", "lenient").to_lowercase().as_str() {
                "lenient" => PersistPolicy::ContinueOnPersistError,
                "strict" => PersistPolicy::FailOnPersistError,
                other => return Err(ConfigError::Invalid { key: "TOKEN_PERSIST_POLICY", value: other.to_string() }),
            },
            notify_policy: match or_default("FREE_GAMES_NOTIFY_POLICY", "notify").to_lowercase().as_str() {
                "notify" => NotifyPolicy::NotifyUnpersisted,
                "skip" => NotifyPolicy::SkipUnpersisted,
                other => return Err(ConfigError::Invalid { key: "FREE_GAMES_NOTIFY_POLICY", value: other.to_string() }),
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { key, value })
}

fn minutes(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    let minutes: u64 = parse_number(key, value)?;
    if minutes == 0 {
        return Err(ConfigError::Invalid { key, value: "0".to_string() });
    }
    Ok(Duration::from_secs(minutes * 60))
}
