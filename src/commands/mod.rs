pub mod wowtoken;

use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use tracing::error;
use crate::utils::{check_cooldown, extract_clean_error};

pub async fn handle_message(ctx: &Context, msg: &Message) {
    if msg.author.bot {
        return;
    }

    // Parse command and arguments
    let parts: Vec<&str> = msg.content.split_whitespace().collect();
    if parts.is_empty() {
        return;
    }

    let command = parts[0];
    let args = &parts[1..];

    if command != "$wowtoken" {
        return;
    }

    if let Err((remaining, should_warn)) = check_cooldown(msg.author.id, command).await {
        if should_warn {
            let _ = msg.channel_id.send_message(
                ctx,
                CreateMessage::default().embed(
                    CreateEmbed::default()
                        .title("Command Cooldown")
                        .description(format!("⏳ Please wait {} seconds before using this command again.", remaining))
                        .color(0xffa500)
                )
            ).await;
        }
        return;
    }

    let result = wowtoken::execute(ctx, msg, args).await;

    if let Err(e) = result {
        error!("❌ Error executing command {}: {}", command, e);

        let clean_error = extract_clean_error(&e);

        // Determine error type and create user-friendly message
        let user_message = if e.contains("429") || e.contains("rate limit") {
            "⚠️ **Rate Limited**: Please try again in a moment.".to_string()
        } else if e.contains("HTTP request") {
            "⚠️ **Network Error**: Having trouble connecting. Please try again.".to_string()
        } else if !clean_error.is_empty() {
            format!("❌ {}", clean_error)
        } else {
            "❌ An error occurred while executing the command.".to_string()
        };

        let embed = CreateEmbed::default()
            .title("Command Error")
            .description(user_message)
            .color(0xff0000);

        let _ = msg.channel_id
            .send_message(ctx, CreateMessage::default().embed(embed))
            .await;
    }
}
