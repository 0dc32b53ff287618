pub mod client;
pub mod models;

pub use client::{BlizzardClient, TokenExchange, TokenPriceFeed};
pub use models::{AuthTokenResponse, ClientCredentials, TokenPriceResponse};
