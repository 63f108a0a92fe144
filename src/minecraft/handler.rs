//! Minecraft event handling.
//!
//! Drains relay events one at a time: in-game commands first, then chat,
//! presence and guild events go to the bridge facade.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::bridge::channels::HandlerChannels;
use crate::bridge::Bridge;
use crate::commands::CommandRouter;
use crate::common::error::CommandError;
use crate::common::{ChannelTag, GameEvent, OutgoingGameMessage};
use crate::config::types::Config;
use crate::discord::transport::DiscordTransport;
use crate::minecraft::chat::{ChatLine, ChatParser, LEFT_COLOR};
use crate::minecraft::commands::{registry, MinecraftCommandContext};

pub struct MinecraftHandler<T: DiscordTransport + 'static> {
    bridge: Arc<Bridge<T>>,
    parser: ChatParser,
    router: CommandRouter<MinecraftCommandContext>,
    game_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    discord_invite: Option<String>,
    /// Name the relay is logged in as, once known.
    bot_username: Option<String>,
}

impl<T: DiscordTransport + 'static> MinecraftHandler<T> {
    pub fn new(
        config: &Config,
        bridge: Arc<Bridge<T>>,
        game_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    ) -> Result<Self, CommandError> {
        let prefix = config.minecraft.prefix.as_str();
        Ok(Self {
            bridge,
            parser: ChatParser::new(),
            router: CommandRouter::new(prefix, registry(prefix))?,
            game_tx,
            discord_invite: config.minecraft.discord_invite.clone(),
            bot_username: None,
        })
    }

    /// Process events until the relay side hangs up or shutdown is signalled.
    pub async fn run(
        mut self,
        mut game_events_rx: mpsc::UnboundedReceiver<GameEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = game_events_rx.recv() => {
                    let Some(event) = event else {
                        debug!("Game events channel closed.");
                        break;
                    };
                    self.handle_event(event).await;
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping Minecraft event processing");
                        break;
                    }
                }
            }
        }
    }

    /// Run with the handler half of a channel bundle.
    pub async fn run_with(self, channels: HandlerChannels) {
        self.run(channels.game_events_rx, channels.shutdown_rx).await;
    }

    pub async fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::LoggedIn { username } => {
                info!("Minecraft bot logged in as {}", username);
                self.bot_username = Some(username);
            }
            GameEvent::Chat { message } => self.handle_chat(&message).await,
            GameEvent::Kicked { reason } => {
                warn!("Minecraft bot was kicked: {}", reason);
                let message = format!("Minecraft bot was kicked: {}", reason);
                if let Err(e) = self
                    .bridge
                    .broadcast_clean_embed(&message, LEFT_COLOR, ChannelTag::Logger)
                    .await
                {
                    error!("Failed to report kick: {}", e);
                }
            }
            GameEvent::Disconnected => {
                debug!("Minecraft relay disconnected");
                self.bot_username = None;
            }
        }
    }

    async fn handle_chat(&self, raw: &str) {
        let Some(line) = self.parser.parse(raw, self.bot_username.as_deref()) else {
            debug!("Ignoring game line: {}", raw);
            return;
        };

        let result = match line {
            ChatLine::Chat(event) => {
                let ctx = MinecraftCommandContext {
                    game_tx: self.game_tx.clone(),
                    channel: event.channel,
                    discord_invite: self.discord_invite.clone(),
                };
                match self.router.handle(&ctx, &event.username, &event.message).await {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(e) => {
                        error!("Command handler error: {}", e);
                        return;
                    }
                }
                self.bridge.broadcast(&event).await
            }
            ChatLine::Presence(event) => self.bridge.player_toggle(&event).await,
            ChatLine::GuildEvent { message, color } => {
                for tag in [ChannelTag::Guild, ChannelTag::Logger] {
                    if let Err(e) = self.bridge.broadcast_clean_embed(&message, color, tag).await {
                        error!("Failed to send guild event to {:?}: {}", tag, e);
                    }
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Failed to relay game chat: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::resolver::tests::test_config;
    use crate::discord::transport::tests::{RecordingTransport, Sent};
    use crate::minecraft::chat::JOINED_COLOR;
    use crate::render::tests::make_renderer;
    use serenity::model::id::ChannelId;

    struct Harness {
        handler: MinecraftHandler<RecordingTransport>,
        transport: Arc<RecordingTransport>,
        game_rx: mpsc::UnboundedReceiver<OutgoingGameMessage>,
    }

    fn harness() -> Harness {
        let config = test_config();
        let transport = Arc::new(RecordingTransport::default());
        let bridge = Arc::new(Bridge::new(&config, Arc::clone(&transport), make_renderer()));
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        Harness {
            handler: MinecraftHandler::new(&config, bridge, game_tx).unwrap(),
            transport,
            game_rx,
        }
    }

    fn chat(message: &str) -> GameEvent {
        GameEvent::Chat {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_guild_chat_is_broadcast() {
        let mut h = harness();
        h.handler.handle_event(chat("§2Guild > Steve [Member]: hello")).await;

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        let Sent::Embed(channel, embed) = &sent[0] else {
            panic!("expected embed, got {:?}", sent[0]);
        };
        assert_eq!(*channel, ChannelId::new(1));
        assert_eq!(embed.description.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_commands_are_answered_in_game() {
        let mut h = harness();
        h.handler.handle_event(chat("Officer > Steve: !ping")).await;

        assert_eq!(h.game_rx.try_recv().unwrap().content, "/oc Pong!");
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_lines_are_not_echoed() {
        let mut h = harness();
        h.handler
            .handle_event(GameEvent::LoggedIn {
                username: "BridgeBot".to_string(),
            })
            .await;
        h.handler.handle_event(chat("Guild > BridgeBot: Alex: hi")).await;
        assert!(h.transport.sent().is_empty());

        // Name is forgotten after a disconnect
        h.handler.handle_event(GameEvent::Disconnected).await;
        h.handler.handle_event(chat("Guild > BridgeBot: back")).await;
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_guild_events_go_to_guild_and_logger() {
        let mut h = harness();
        h.handler.handle_event(chat("[VIP] Steve joined the guild!")).await;

        let channels: Vec<ChannelId> = h
            .transport
            .sent()
            .into_iter()
            .map(|sent| match sent {
                Sent::Embed(channel, embed) => {
                    assert_eq!(embed.color, Some(JOINED_COLOR));
                    channel
                }
                other => panic!("expected embed, got {:?}", other),
            })
            .collect();
        assert_eq!(channels, vec![ChannelId::new(1), ChannelId::new(3)]);
    }

    #[tokio::test]
    async fn test_presence_is_toggled() {
        let mut h = harness();
        h.handler.handle_event(chat("Guild > Steve left.")).await;

        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness();
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(h.handler.run(events_rx, shutdown_rx));
        shutdown_tx.send(true).unwrap();
        tokio_test::assert_ok!(task.await);
    }
}
