use async_trait::async_trait;
use reqwest::Client as HttpClient;
use super::models::{CatalogElement, FreeGamesResponse};
use crate::api::{build_http_client, ApiError};

/// Source of the storefront promotions catalog
#[async_trait]
pub trait FreeGamesFeed: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogElement>, ApiError>;
}

/// Epic Games Store client for the free games promotions feed
pub struct EpicGamesClient {
    http_client: HttpClient,
    free_games_api_url: String,
}

impl EpicGamesClient {
    pub fn new(free_games_api_url: String) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: build_http_client()?,
            free_games_api_url,
        })
    }
}

#[async_trait]
impl FreeGamesFeed for EpicGamesClient {
    /// GET {free_games_api_url}
    async fn fetch_catalog(&self) -> Result<Vec<CatalogElement>, ApiError> {
        let response = self.http_client
            .get(&self.free_games_api_url)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Failed to fetch latest free games: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let body = response
            .json::<FreeGamesResponse>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse free games response: {}", e)))?;

        Ok(body.data.catalog.search_store.elements)
    }
}
