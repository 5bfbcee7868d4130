//! Discord member bot - assigns a configured role to every member who joins.

mod commands;
mod config;
mod diagnostics;
mod discord_gateway;
mod gateway;
mod handlers;
mod join_policy;
mod messages;
mod telemetry;


use std::sync::Arc;

use anyhow::Context as _;
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Guild, Member, Message};
use serenity::async_trait;
use serenity::model::gateway::Ready;
use tracing::{error, info};
use warp::Filter;

use crate::config::Config;

/// Main event handler sharing the read-only configuration.
struct Handler {
    config: Arc<Config>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        handlers::handle_ready(&ctx, &ready);
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        if let Err(e) = handlers::handle_member_join(&ctx, &self.config, &new_member).await {
            handlers::report_event_error("guild_member_addition", &e);
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new == Some(true) {
            handlers::handle_guild_join(&self.config, &guild);
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = handlers::handle_message(&ctx, &self.config, &msg).await {
            handlers::report_event_error("message", &e);
        }
    }
}

/// Serves `OK` on `/` so hosting platforms can probe the process.
async fn run_health_check(port: u16) {
    let health_check =
        warp::path::end().map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    info!(port, "Starting health check server");
    warp::serve(health_check).run(([0, 0, 0, 0], port)).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Invalid configuration")?;
    let _log_guard = telemetry::init_tracing(config.log_level).context("Error opening log file")?;

    let token = match config::bot_token_from_env() {
        Ok(token) => token,
        Err(e) => {
            error!("{e}. Please set your bot token.");
            return Err(e).context("Missing bot token");
        }
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    if let Some(port) = config.health_check_port {
        tokio::spawn(run_health_check(port));
    }

    let handler = Handler {
        config: Arc::new(config),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("Error creating client")?;

    info!("Starting Discord Member Bot...");

    if let Err(e) = client.start().await {
        error!("Client error: {e}");
        return Err(e).context("Error running bot");
    }

    Ok(())
}
