use std::sync::Arc;
use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use tracing::info;
use crate::models::NewPromotionEntry;

/// Discord allows at most 10 embeds per message
const MAX_EMBEDS_PER_MESSAGE: usize = 10;
const MAX_FIELD_LENGTH: usize = 1024;

/// Receives newly detected free games
#[async_trait]
pub trait FreeGameNotifier: Send + Sync {
    async fn notify(&self, games: &[NewPromotionEntry]) -> Result<(), String>;
}

/// Posts free game announcements to a Discord channel
pub struct DiscordNotifier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

fn truncate_field(value: &str) -> String {
    if value.trim().is_empty() {
        return "No description available".to_string();
    }
    if value.chars().count() <= MAX_FIELD_LENGTH {
        return value.to_string();
    }
    let mut out: String = value.chars().take(MAX_FIELD_LENGTH - 1).collect();
    out.push('…');
    out
}

/// Build one embed per free game
pub fn create_free_game_embeds(games: &[NewPromotionEntry]) -> Vec<CreateEmbed> {
    games
        .iter()
        .map(|game| {
            let mut embed = CreateEmbed::default()
                .title(&game.title)
                .url(&game.url)
                .field("Free at", "Epic Games Store", false)
                .field("Description", truncate_field(&game.description), false)
                .field(
                    "Free Until",
                    game.active_until.format("%A, %B %d, %Y at %I:%M%p UTC").to_string(),
                    false,
                )
                .color(0x2a2a2a);

            if !game.thumbnail_url.is_empty() {
                embed = embed.image(&game.thumbnail_url);
            }

            embed
        })
        .collect()
}

#[async_trait]
impl FreeGameNotifier for DiscordNotifier {
    async fn notify(&self, games: &[NewPromotionEntry]) -> Result<(), String> {
        for chunk in games.chunks(MAX_EMBEDS_PER_MESSAGE) {
            let message = CreateMessage::default().embeds(create_free_game_embeds(chunk));
            self.channel_id
                .send_message(&*self.http, message)
                .await
                .map_err(|e| e.to_string())?;
        }

        info!("Announced {} free game(s) in channel {}", games.len(), self.channel_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn game(title: &str, thumbnail: &str) -> NewPromotionEntry {
        NewPromotionEntry {
            store_id: "id".to_string(),
            title: title.to_string(),
            description: String::new(),
            url: "https://store/game".to_string(),
            thumbnail_url: thumbnail.to_string(),
            active_from: Utc::now(),
            active_until: Utc::now(),
        }
    }

    #[test]
    fn test_one_embed_per_game() {
        let embeds = create_free_game_embeds(&[game("A", ""), game("B", "https://img/b.png")]);
        assert_eq!(embeds.len(), 2);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("  "), "No description available");
        assert_eq!(truncate_field("short"), "short");
        let long = "x".repeat(2000);
        assert_eq!(truncate_field(&long).chars().count(), MAX_FIELD_LENGTH);
    }
}
