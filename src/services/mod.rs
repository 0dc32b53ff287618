pub mod auth_token_cache;
pub mod chart_service;
pub mod free_game_service;
pub mod notifier;
pub mod scheduler;
pub mod token_price_service;

pub use auth_token_cache::AuthTokenCache;
pub use chart_service::ChartService;
pub use free_game_service::{FreeGameService, NotifyPolicy};
pub use notifier::DiscordNotifier;
pub use scheduler::spawn_interval;
pub use token_price_service::{PersistPolicy, TokenPriceService};
