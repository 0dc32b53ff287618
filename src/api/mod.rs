pub mod error;
pub mod blizzard;
pub mod epic;

use std::time::Duration;
use reqwest::Client as HttpClient;

pub use error::ApiError;

/// Timeout applied to every upstream HTTP call
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the shared reqwest client used by the upstream API clients
pub fn build_http_client() -> Result<HttpClient, ApiError> {
    HttpClient::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .build()
        .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))
}
