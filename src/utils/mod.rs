pub mod errors;
pub mod format;
pub mod ratelimit;

pub use errors::extract_clean_error;
pub use format::{format_gold, singularize};
pub use ratelimit::{check_cooldown};
