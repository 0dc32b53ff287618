use std::sync::Arc;
use serenity::all::ActivityData;
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod db;
mod models;
mod services;
mod utils;
mod web;

use api::blizzard::{BlizzardClient, ClientCredentials};
use api::epic::EpicGamesClient;
use config::AppConfig;
use db::MySqlStore;
use services::{
    spawn_interval, AuthTokenCache, ChartService, DiscordNotifier, FreeGameService, TokenPriceService,
};

struct Handler;

pub struct TokenPrices;

impl TypeMapKey for TokenPrices {
    type Value = Arc<TokenPriceService>;
}

pub struct Charts;

impl TypeMapKey for Charts {
    type Value = Arc<ChartService>;
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        commands::handle_message(&ctx, &msg).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected to {} guild(s)", ready.user.name, ready.guilds.len());
        ctx.set_activity(Some(ActivityData::watching("the WoW token price")));
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("tokenwatch=debug".parse().expect("valid log directive"))
            .add_directive("serenity=warn".parse().expect("valid log directive")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("🪙 Starting tokenwatch v{}...", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    // Initialize database
    info!("Initializing database...");
    let pool = match db::init_db(&config.database_url).await {
        Ok(p) => {
            info!("Database initialized successfully");
            p
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };
    let store = Arc::new(MySqlStore::new(pool));

    let blizzard = match BlizzardClient::new(config.auth_token_url.clone(), config.token_price_url.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Blizzard client: {}", e);
            return;
        }
    };
    let epic = match EpicGamesClient::new(config.free_games_api_url.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Epic Games client: {}", e);
            return;
        }
    };

    let credentials = ClientCredentials {
        client_id: config.blizzard_client_id.clone(),
        client_secret: config.blizzard_client_secret.clone(),
    };
    let prices = Arc::new(TokenPriceService::new(
        store.clone(),
        blizzard.clone(),
        AuthTokenCache::new(blizzard),
        credentials,
        config.persist_policy,
    ));
    let charts = Arc::new(ChartService::new(store.clone()));
    let free_games = Arc::new(FreeGameService::new(
        store,
        epic,
        config.product_base_url.clone(),
        config.notify_policy,
    ));

    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGES;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Handler)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create client: {}", e);
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<TokenPrices>(prices.clone());
        data.insert::<Charts>(charts.clone());
    }

    let notifier = Arc::new(DiscordNotifier::new(
        client.http.clone(),
        ChannelId::new(config.deals_channel_id),
    ));
    let cancel = CancellationToken::new();

    let price_task = {
        let prices = prices.clone();
        spawn_interval("WoW Token", config.wow_token_interval, cancel.clone(), move || {
            let prices = prices.clone();
            async move { prices.fetch_token_price().await.map(|_| ()) }
        })
    };

    let free_games_task = spawn_interval("EGS Free Games", config.free_games_interval, cancel.clone(), move || {
        let free_games = free_games.clone();
        let notifier = notifier.clone();
        async move { free_games.publish_new_free_games(notifier.as_ref()).await.map(|_| ()) }
    });

    let web_task = {
        let addr = config.listen_addr();
        let state = web::WebState::new(charts, prices.grace_period());
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = web::serve(&addr, state, cancel).await {
                error!("HTTP server error: {}", e);
            }
        })
    };

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!("Client error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down...");
        }
    }

    cancel.cancel();
    let _ = tokio::join!(price_task, free_games_task, web_task);
    shard_manager.shutdown_all().await;
    info!("Shutdown complete");
}
