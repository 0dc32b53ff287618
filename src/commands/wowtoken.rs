use chrono::{DateTime, Duration, Utc};
use serenity::all::{CreateAttachment, CreateEmbedFooter};
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use crate::models::{ChartRequest, PriceObservation};
use crate::utils::{format_gold, singularize};

const DEFAULT_PERIOD: &str = "48";
const DEFAULT_UNIT: &str = "hours";
const CHART_FILENAME: &str = "wow_token_chart.png";

/// Lowest and highest price in a series
pub fn price_range(series: &[PriceObservation]) -> Option<(i64, i64)> {
    let low = series.iter().map(|p| p.price).min()?;
    let high = series.iter().map(|p| p.price).max()?;
    Some((low, high))
}

/// Whole minutes until the stored price goes stale, at least 1
pub fn next_update_minutes(observed_at: DateTime<Utc>, grace_period: Duration, now: DateTime<Utc>) -> i64 {
    (grace_period - (now - observed_at)).num_minutes().max(1)
}

fn gold(amount: i64) -> String {
    format!("🪙 **{}** gold", format_gold(amount))
}

pub async fn execute(ctx: &Context, msg: &Message, args: &[&str]) -> Result<(), String> {
    tracing::info!("🪙 WoW token command called with args: {:?}", args);

    let period = args.first().copied().unwrap_or(DEFAULT_PERIOD);
    let unit = args.get(1).copied().unwrap_or(DEFAULT_UNIT);
    let request = ChartRequest::parse_alias(unit, period)
        .map_err(|e| format!("{}\nUsage: `$wowtoken [period] [hours|days|months]`", e))?;

    let (prices, charts) = {
        let data = ctx.data.read().await;
        let prices = data.get::<crate::TokenPrices>()
            .ok_or("Token price service not initialized".to_string())?
            .clone();
        let charts = data.get::<crate::Charts>()
            .ok_or("Chart service not initialized".to_string())?
            .clone();
        (prices, charts)
    };

    if let Err(e) = msg.channel_id.broadcast_typing(ctx.http.as_ref()).await {
        tracing::warn!("Failed to broadcast typing: {}", e);
    }

    let current = prices.fetch_token_price().await.map_err(|e| e.to_string())?;
    let (series, last_updated) = charts.load_series(&request).await.map_err(|e| e.to_string())?;
    let (low, high) = price_range(&series).ok_or("No price history available".to_string())?;
    let chart = charts
        .render_series(request, series, last_updated)
        .await
        .map_err(|e| e.to_string())?;

    let next_update = next_update_minutes(current.observed_at, prices.grace_period(), Utc::now());
    let span = format!("{}-{}", request.period, singularize(request.unit.as_str()));

    let embed = CreateEmbed::default()
        .title("World of Warcraft Token Price")
        .field("Current Price", gold(current.price), false)
        .field(format!("{} High", span), gold(high), true)
        .field(format!("{} Low", span), gold(low), true)
        .field(
            "Next Update",
            format!(
                "In approximately **{}** minute{}",
                next_update,
                if next_update > 1 { "s" } else { "" }
            ),
            false,
        )
        .image(format!("attachment://{}", CHART_FILENAME))
        .footer(CreateEmbedFooter::new(format!("Last updated {}", last_updated.format("%b %-d, %Y %H:%M UTC"))))
        .color(0xffd700);

    let message = CreateMessage::default()
        .embed(embed)
        .add_file(CreateAttachment::bytes(chart.image, CHART_FILENAME));

    msg.channel_id
        .send_message(ctx, message)
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}
