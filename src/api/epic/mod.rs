pub mod client;
pub mod models;

pub use client::{EpicGamesClient, FreeGamesFeed};
pub use models::{CatalogElement, PromotionWindow};
