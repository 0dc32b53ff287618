//! Data models for tokenwatch services
//!
//! Value objects passed between the store, the fetchers and the
//! presentation layers (chat embeds and the chart endpoint).

pub mod token_price;
pub mod free_game;
pub mod chart;

pub use token_price::PriceObservation;
pub use free_game::{PromotionEntry, NewPromotionEntry};
pub use chart::{ChartUnit, ChartRequest, RenderedChart};
