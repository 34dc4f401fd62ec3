//! Guildgate - WoW character verification bot for Discord
//!
//! Members register their World of Warcraft character with `!register`; the
//! bot checks it against the Blizzard API and grants community and guild
//! member roles.

mod blizzard;
mod common;
mod config;
mod discord;
mod logging;
mod roles;
mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use blizzard::BlizzardClient;
use common::error::AppError;
use config::env::{get_config_path, get_log_file};
use config::{load_and_validate, Config};
use discord::{role_guild, BotHandler, DiscordBotBuilder, Dispatcher};
use store::RegistrationStore;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging(get_log_file().as_deref());

    info!("Guildgate v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Region: {}", config.blizzard.region);
    info!("  API: {}", config.blizzard.api_url());
    info!("  Database: {}", config.database.path);
    match &config.blizzard.guild {
        Some(guild) => info!("  Guild: {} ({})", guild.name, guild.id),
        None => info!("  Guild: none (guild member roles disabled)"),
    }

    let dispatcher = build_dispatcher(&config).await?;
    let handler = BotHandler::new(Arc::new(dispatcher), role_guild(config.discord.guild_id));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let discord_bot = DiscordBotBuilder::new(config.discord.token.clone(), handler, shutdown_rx)
        .build()
        .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(discord_bot.run());

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            true
        }
        _ = &mut discord_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (Discord task already exited): {}", e);
        }
        match tokio::time::timeout(Duration::from_secs(5), discord_task).await {
            Ok(Ok(())) => info!("Discord client disconnected gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

/// Open the store, seed configured admins and wire up the Blizzard client.
async fn build_dispatcher(config: &Config) -> Result<Dispatcher, AppError> {
    let store = RegistrationStore::connect(&config.database.path).await?;
    for admin in &config.discord.admins {
        store.add_admin(admin.trim()).await?;
        info!("Seeded admin {}", admin.trim());
    }

    let api = BlizzardClient::from_config(&config.blizzard)?;

    Ok(Dispatcher::new(
        store,
        Arc::new(api),
        config.discord.roles.policy(),
        config.blizzard.guild.clone(),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
