//! Discord bot client.
//!
//! Forwards gateway events over a channel to a single processing loop,
//! reconnects with backoff and stops the shards on shutdown.

use std::sync::Arc;
use std::time::Duration;

use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::UserId;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;
use crate::common::reconnect::{next_delay, reconnect_backoff};
use crate::discord::handler::{DiscordMessageHandler, IncomingMessage};
use crate::discord::transport::SerenityTransport;

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready(Ready),
    /// Message received.
    Message { context: Context, message: Message },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        if let Err(error) = self.discord_events_tx.send(DiscordBotEvent::Ready(ready)) {
            warn!("Failed to process discord event: {}", error);
        }
    }

    async fn message(&self, context: Context, message: Message) {
        if let Err(error) = self
            .discord_events_tx
            .send(DiscordBotEvent::Message { context, message })
        {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

/// Build the reqwest client shared by the gateway and REST sides.
pub fn build_reqwest_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

async fn build_client(
    token: &str,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS;

    let http = HttpBuilder::new(token)
        .client(build_reqwest_client()?)
        .build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    bridge: Arc<Bridge<SerenityTransport>>,
    handler: DiscordMessageHandler<SerenityTransport>,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    pub async fn new(
        token: String,
        bridge: Arc<Bridge<SerenityTransport>>,
        handler: DiscordMessageHandler<SerenityTransport>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<Self> {
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();
        let client = build_client(&token, discord_events_tx.clone()).await?;

        Ok(Self {
            client: Some(client),
            token,
            bridge,
            handler,
            discord_events_rx,
            discord_events_tx,
            shutdown_rx,
        })
    }

    pub async fn run(mut self) {
        // Extract shard manager before we move client into run_connection
        let shard_manager = self.client.as_ref().map(|c| c.shard_manager.clone());
        let mut shutdown_rx = self.shutdown_rx.clone();
        let connection =
            Self::run_connection(&mut self.client, &self.token, &self.discord_events_tx);
        let events = Self::process_events(&mut self.discord_events_rx, &self.bridge, &self.handler);

        // Shutdown is watched by the last branch only
        tokio::select! {
            _ = connection => {},
            _ = events => {},
            _ = async {
                // Wait for shutdown signal
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                // Gracefully shutdown Discord gateway
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        client: &mut Option<Client>,
        token: &str,
        discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>,
    ) {
        let mut backoff = reconnect_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => {
                    // serenity mostly handles reconnections itself.
                    match build_client(token, discord_events_tx.clone()).await {
                        Ok(client) => {
                            backoff = reconnect_backoff();
                            client
                        }
                        Err(e) => {
                            error!("Failed to rebuild Discord client: {}", e);
                            let delay = next_delay(&mut backoff);
                            warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                            sleep(delay).await;
                            continue;
                        }
                    }
                }
            };

            match client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = next_delay(&mut backoff);
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    sleep(delay).await;
                }
            }
        }
    }

    async fn process_events(
        discord_events_rx: &mut mpsc::UnboundedReceiver<DiscordBotEvent>,
        bridge: &Bridge<SerenityTransport>,
        handler: &DiscordMessageHandler<SerenityTransport>,
    ) {
        let mut self_id: Option<UserId> = None;

        loop {
            match discord_events_rx.recv().await {
                Some(DiscordBotEvent::Ready(ready)) => {
                    info!("Discord bot connected as {}", ready.user.name);
                    self_id = Some(ready.user.id);
                    let avatar = ready.user.avatar_url();
                    if let Err(e) = bridge.on_ready(&ready.user.name, avatar).await {
                        error!("Failed to announce bridge start: {}", e);
                    }
                }
                Some(DiscordBotEvent::Message { context, message }) => {
                    let Some(self_id) = self_id else {
                        debug!("Dropping message received before Ready");
                        continue;
                    };
                    let incoming = IncomingMessage::from(&message);
                    handler.handle_message(incoming, self_id, &*context.cache).await;
                }
                Some(DiscordBotEvent::Disconnected) => {
                    self_id = None;
                }
                None => {
                    debug!("Discord events channel closed.");
                    break;
                }
            }
        }
    }
}
