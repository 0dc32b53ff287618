use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use super::models::{AuthTokenResponse, ClientCredentials, TokenPriceResponse};
use crate::api::{build_http_client, ApiError};

/// Client-credentials exchange against the OAuth endpoint
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, credentials: &ClientCredentials) -> Result<AuthTokenResponse, ApiError>;
}

/// Authenticated token price lookup
#[async_trait]
pub trait TokenPriceFeed: Send + Sync {
    async fn fetch_price(&self, bearer_token: &str) -> Result<TokenPriceResponse, ApiError>;
}

/// Blizzard API client for OAuth tokens and the WoW token price
pub struct BlizzardClient {
    http_client: HttpClient,
    auth_token_url: String,
    token_price_url: String,
}

impl BlizzardClient {
    pub fn new(auth_token_url: String, token_price_url: String) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: build_http_client()?,
            auth_token_url,
            token_price_url,
        })
    }

    /// Basic auth header with both credential halves percent-encoded
    fn basic_auth_header(credentials: &ClientCredentials) -> Result<HeaderValue, ApiError> {
        let raw = format!(
            "{}:{}",
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(&credentials.client_secret)
        );
        HeaderValue::from_str(&format!("Basic {}", BASE64.encode(raw)))
            .map_err(|e| ApiError::RequestError(format!("Failed to create auth header: {}", e)))
    }

    fn bearer_headers(bearer_token: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|e| ApiError::RequestError(format!("Failed to create auth header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);
        Ok(headers)
    }
}

#[async_trait]
impl TokenExchange for BlizzardClient {
    /// POST {auth_token_url}
    async fn exchange(&self, credentials: &ClientCredentials) -> Result<AuthTokenResponse, ApiError> {
        let response = self.http_client
            .post(&self.auth_token_url)
            .header(AUTHORIZATION, Self::basic_auth_header(credentials)?)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Auth token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        response
            .json::<AuthTokenResponse>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse auth token response: {}", e)))
    }
}

#[async_trait]
impl TokenPriceFeed for BlizzardClient {
    /// GET {token_price_url}
    async fn fetch_price(&self, bearer_token: &str) -> Result<TokenPriceResponse, ApiError> {
        let response = self.http_client
            .get(&self.token_price_url)
            .headers(Self::bearer_headers(bearer_token)?)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Token price request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        response
            .json::<TokenPriceResponse>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse token price response: {}", e)))
    }
}
