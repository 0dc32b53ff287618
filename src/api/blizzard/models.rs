use serde::{Deserialize, Serialize};

/// Response from the client-credentials token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// Response from the WoW token price endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPriceResponse {
    /// Milliseconds since the unix epoch
    pub last_updated_timestamp: i64,
    /// Price in copper
    pub price: i64,
}

/// API client credentials
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
