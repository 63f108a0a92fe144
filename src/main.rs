//! Guildhall - Discord-Minecraft guild chat bridge
//!
//! Relays guild and officer chat between a Minecraft server (through a
//! chat relay client) and Discord channels.

mod bridge;
mod commands;
mod common;
mod config;
mod discord;
mod minecraft;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serenity::http::HttpBuilder;
use tokio::signal;
use tracing::{debug, error, info, warn};

use bridge::{Bridge, ChannelBundle};
use config::{env::get_config_path, load_and_validate};
use discord::{build_reqwest_client, DiscordBot, DiscordMessageHandler, SerenityTransport};
use minecraft::{MinecraftConnector, MinecraftHandler};
use render::{BitmapChatRenderer, MessageRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Guildhall v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        error!("See guildhall.conf.example for reference.");
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Relay: {}:{}", config.minecraft.relay.host, config.minecraft.relay.port);
    info!("  Message mode: {}", config.discord.message_mode);

    // ============================================================
    // Bridge facade
    // ============================================================
    let http = HttpBuilder::new(&config.discord.token)
        .client(build_reqwest_client()?)
        .build();
    let transport = Arc::new(SerenityTransport::new(Arc::new(http)));
    let renderer = MessageRenderer::new(
        config.discord.avatar_url.clone(),
        Arc::new(BitmapChatRenderer::default()),
    );
    let bridge = Arc::new(Bridge::new(&config, transport, renderer));

    let channels = ChannelBundle::new();
    let shutdown_tx = channels.control.shutdown_tx;
    let outgoing_tx = channels.handlers.outgoing_tx.clone();

    // ============================================================
    // Minecraft side
    // ============================================================
    let minecraft_handler = MinecraftHandler::new(&config, bridge.clone(), outgoing_tx.clone())?;
    let connector = MinecraftConnector::new(config.minecraft.relay.clone(), channels.connector);

    let mut connector_task = tokio::spawn(connector.run());
    let minecraft_task = tokio::spawn(minecraft_handler.run_with(channels.handlers));

    // ============================================================
    // Discord side
    // ============================================================
    let discord_handler = DiscordMessageHandler::new(&config, bridge.clone(), outgoing_tx)?;
    let discord_bot = DiscordBot::new(
        config.discord.token.clone(),
        bridge.clone(),
        discord_handler,
        shutdown_tx.subscribe(),
    )
    .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(discord_bot.run());

    // ============================================================
    // Run until a signal or a task exits
    // ============================================================
    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - closing bridge...");
            true
        }
        _ = &mut connector_task => false,
        _ = &mut discord_task => false,
        _ = minecraft_task => false,
    };

    if shutdown {
        if let Err(e) = bridge.on_close().await {
            warn!("Failed to announce bridge shutdown: {}", e);
        }

        // Fire-and-forget: receivers may already be gone
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (tasks already exited): {}", e);
        }

        let timeout = Duration::from_secs(5);
        let stopped = async { tokio::join!(connector_task, discord_task) };
        match tokio::time::timeout(timeout, stopped).await {
            Ok((connector, discord)) => {
                if let Err(e) = connector {
                    warn!("Connector task panicked: {}", e);
                }
                if let Err(e) = discord {
                    warn!("Discord task panicked: {}", e);
                }
                info!("Bridge stopped gracefully");
            }
            Err(_) => warn!("Shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
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
