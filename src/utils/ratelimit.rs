use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use lazy_static::lazy_static;
use serenity::model::id::UserId;
use tokio::sync::Mutex;

lazy_static! {
    static ref COMMAND_COOLDOWNS: Mutex<CooldownTracker> = Mutex::new(CooldownTracker::new(COOLDOWN_SECONDS));
}

const COOLDOWN_SECONDS: u64 = 5;

/// Per (user, command) cooldown bookkeeping
pub struct CooldownTracker {
    cooldown: u64,
    last_used: HashMap<(UserId, String), u64>,
    // When we last warned a user, so a burst of retries gets only one warning
    last_warned: HashMap<(UserId, String), u64>,
}

impl CooldownTracker {
    pub fn new(cooldown: u64) -> Self {
        Self {
            cooldown,
            last_used: HashMap::new(),
            last_warned: HashMap::new(),
        }
    }

    /// Returns Ok(()) and records the use if the cooldown has passed.
    /// Returns Err((remaining_seconds, should_warn)) otherwise; should_warn is
    /// true only on the first violation within a cooldown period.
    pub fn check(&mut self, user_id: UserId, command: &str, now: u64) -> Result<(), (u64, bool)> {
        // Entries older than the cooldown no longer affect any check
        let cooldown = self.cooldown;
        self.last_used.retain(|_, used| now.saturating_sub(*used) < cooldown);
        self.last_warned.retain(|_, warned| now.saturating_sub(*warned) < cooldown);

        let key = (user_id, command.to_string());

        if let Some(&last_time) = self.last_used.get(&key) {
            let elapsed = now.saturating_sub(last_time);
            if elapsed < self.cooldown {
                let should_warn = match self.last_warned.get(&key) {
                    Some(&last_warning) => last_warning < last_time,
                    None => true,
                };
                if should_warn {
                    self.last_warned.insert(key, now);
                }
                return Err((self.cooldown - elapsed, should_warn));
            }
        }

        self.last_used.insert(key, now);
        Ok(())
    }
}

/// Check if a user can execute a command (cooldown not active)
pub async fn check_cooldown(user_id: UserId, command: &str) -> Result<(), (u64, bool)> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    COMMAND_COOLDOWNS.lock().await.check(user_id, command, now)
}
