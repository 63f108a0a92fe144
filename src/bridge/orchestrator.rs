//! Bridge facade that turns game events into Discord messages.
//!
//! Resolves the destination channel, renders the payload for the
//! configured message mode and delivers it through the transport.

use std::sync::{Arc, OnceLock};

use serenity::model::id::ChannelId;
use tracing::{debug, info};

use crate::common::error::BridgeResult;
use crate::common::{ChannelTag, ChatEvent, PresenceEvent};
use crate::config::types::Config;
use crate::discord::transport::DiscordTransport;
use crate::render::{MessageMode, MessageRenderer, Payload, RenderRequest};

use super::resolver::ChannelResolver;
use super::webhook::WebhookCache;

/// Chat line that exists only to exercise image rendering.
pub const IGNORED_DEBUG_MESSAGE: &str = "debug_temp_message_ignore";

/// Webhook name used before the bot user is known.
const DEFAULT_WEBHOOK_NAME: &str = "Guildhall";

const ONLINE_COLOR: u32 = 2067276;
const OFFLINE_COLOR: u32 = 15548997;

/// The main bridge that orchestrates message flow towards Discord.
pub struct Bridge<T: DiscordTransport> {
    transport: Arc<T>,
    resolver: ChannelResolver,
    renderer: MessageRenderer,
    webhooks: WebhookCache<T::Webhook>,
    /// Configured mode string, parsed on every dispatch.
    message_mode: String,
    max_event_size: usize,
    /// Bot name and avatar, set once the gateway is ready.
    identity: OnceLock<(String, Option<String>)>,
}

impl<T: DiscordTransport> Bridge<T> {
    pub fn new(config: &Config, transport: Arc<T>, renderer: MessageRenderer) -> Self {
        Self {
            transport,
            resolver: ChannelResolver::new(config),
            renderer,
            webhooks: WebhookCache::new(),
            message_mode: config.discord.message_mode.clone(),
            max_event_size: config.console.max_event_size,
            identity: OnceLock::new(),
        }
    }

    pub fn resolver(&self) -> &ChannelResolver {
        &self.resolver
    }

    pub fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }

    fn mode(&self) -> BridgeResult<MessageMode> {
        MessageMode::parse(&self.message_mode)
    }

    fn webhook_name(&self) -> &str {
        self.identity
            .get()
            .map(|(name, _)| name.as_str())
            .unwrap_or(DEFAULT_WEBHOOK_NAME)
    }

    /// Relay a guild or officer chat line.
    pub async fn broadcast(&self, event: &ChatEvent) -> BridgeResult<()> {
        let mode = self.mode()?;

        if event.message == IGNORED_DEBUG_MESSAGE && mode != MessageMode::Minecraft {
            debug!("Dropping debug placeholder message");
            return Ok(());
        }
        if event.channel != ChannelTag::Debug {
            info!(
                kind = "Discord",
                "{} [{}]: {}", event.username, event.guild_rank, event.message
            );
        }

        let channel_id = self.resolver.resolve(event.channel);
        let payload = self.renderer.render(&RenderRequest::Chat(event), mode)?;
        self.deliver(channel_id, payload).await
    }

    /// Send a bare embed (colour and description).
    pub async fn broadcast_clean_embed(
        &self,
        message: &str,
        color: u32,
        tag: ChannelTag,
    ) -> BridgeResult<()> {
        if message.len() < self.max_event_size {
            info!(kind = "Event", "{}", message);
        }

        let channel_id = self.resolver.resolve(tag);
        let payload = self
            .renderer
            .render(&RenderRequest::CleanEmbed { message, color }, MessageMode::Bot)?;
        self.deliver(channel_id, payload).await
    }

    /// Send an embed with an author block.
    pub async fn broadcast_headed_embed(
        &self,
        message: &str,
        title: &str,
        icon: Option<&str>,
        color: u32,
        tag: ChannelTag,
    ) -> BridgeResult<()> {
        if !message.is_empty() && message.len() < self.max_event_size {
            info!(kind = "Event", "{}", message);
        }

        let channel_id = self.resolver.resolve(tag);
        let request = RenderRequest::HeadedEmbed {
            message,
            title,
            icon,
            color,
        };
        let payload = self.renderer.render(&request, MessageMode::Bot)?;
        self.deliver(channel_id, payload).await
    }

    /// Relay a join/leave notification.
    pub async fn player_toggle(&self, event: &PresenceEvent) -> BridgeResult<()> {
        info!(kind = "Event", "{} {}", event.username, event.message);

        let mode = self.mode()?;
        let channel_id = self.resolver.resolve(event.channel);
        let payload = self.renderer.render(&RenderRequest::Toggle(event), mode)?;
        self.deliver(channel_id, payload).await
    }

    /// Announce that the bridge is up. Called on every gateway ready.
    pub async fn on_ready(&self, bot_name: &str, bot_avatar: Option<String>) -> BridgeResult<()> {
        let (name, avatar) = self
            .identity
            .get_or_init(|| (bot_name.to_string(), bot_avatar));
        info!("Client ready, logged in as {}", name);

        self.broadcast_headed_embed(
            "Chat Bridge is Online",
            name,
            avatar.as_deref(),
            ONLINE_COLOR,
            ChannelTag::Guild,
        )
        .await
    }

    /// Announce shutdown. Runs once before the process exits.
    pub async fn on_close(&self) -> BridgeResult<()> {
        let (name, avatar) = match self.identity.get() {
            Some((name, avatar)) => (name.as_str(), avatar.as_deref()),
            None => (DEFAULT_WEBHOOK_NAME, None),
        };

        self.broadcast_headed_embed(
            "Chat Bridge is Offline",
            name,
            avatar,
            OFFLINE_COLOR,
            ChannelTag::Guild,
        )
        .await
    }

    async fn deliver(&self, channel_id: ChannelId, payload: Payload) -> BridgeResult<()> {
        match payload {
            Payload::Embed(embed) => {
                self.transport.send_embed(channel_id, &embed).await?;
            }
            Payload::Webhook(message) => {
                let webhook = self
                    .webhooks
                    .get_or_create(self.transport.as_ref(), channel_id, self.webhook_name())
                    .await?;
                self.transport.execute_webhook(&webhook, &message).await?;
            }
            Payload::Image {
                attachment,
                follow_ups,
            } => {
                self.transport.send_file(channel_id, &attachment).await?;
                for link in &follow_ups {
                    self.transport.send_text(channel_id, link).await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::resolver::tests::test_config;
    use crate::common::error::BridgeError;
    use crate::discord::transport::tests::{RecordingTransport, Sent};
    use crate::render::tests::make_renderer;
    use tokio_test::{assert_err, assert_ok};

    fn bridge_with_mode(mode: &str) -> (Bridge<RecordingTransport>, Arc<RecordingTransport>) {
        let mut config = test_config();
        config.discord.message_mode = mode.to_string();
        let transport = Arc::new(RecordingTransport::default());
        let bridge = Bridge::new(&config, Arc::clone(&transport), make_renderer());
        (bridge, transport)
    }

    fn chat(message: &str, channel: ChannelTag) -> ChatEvent {
        ChatEvent {
            full_message: format!("Guild > Steve [Member]: {}", message),
            username: "Steve".to_string(),
            message: message.to_string(),
            guild_rank: "Member".to_string(),
            channel,
        }
    }

    #[tokio::test]
    async fn test_bot_broadcast_goes_to_guild_chat() {
        let (bridge, transport) = bridge_with_mode("bot");

        assert_ok!(bridge.broadcast(&chat("hello", ChannelTag::Guild)).await);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let Sent::Embed(channel, embed) = &sent[0] else {
            panic!("expected embed, got {:?}", sent[0]);
        };
        assert_eq!(*channel, ChannelId::new(1));
        assert_eq!(embed.description.as_deref(), Some("hello"));
        assert_eq!(embed.footer.as_deref(), Some("Member"));
    }

    #[tokio::test]
    async fn test_officer_broadcast_goes_to_officer_channel() {
        let (bridge, transport) = bridge_with_mode("bot");

        assert_ok!(bridge.broadcast(&chat("secret", ChannelTag::Officer)).await);

        assert!(matches!(&transport.sent()[0], Sent::Embed(id, _) if *id == ChannelId::new(2)));
    }

    #[tokio::test]
    async fn test_webhook_broadcast_reuses_webhook() {
        let (bridge, transport) = bridge_with_mode("webhook");

        assert_ok!(bridge.broadcast(&chat("hi @everyone", ChannelTag::Guild)).await);
        assert_ok!(bridge.broadcast(&chat("again", ChannelTag::Guild)).await);

        let sent = transport.sent();
        let creates = sent
            .iter()
            .filter(|s| matches!(s, Sent::CreateWebhook(..)))
            .count();
        assert_eq!(creates, 1);

        let contents: Vec<_> = sent
            .iter()
            .filter_map(|s| match s {
                Sent::ExecuteWebhook(_, payload) => payload.content.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(contents, vec!["hi everyone", "again"]);
    }

    #[tokio::test]
    async fn test_webhook_uses_bot_name_after_ready() {
        let (bridge, transport) = bridge_with_mode("webhook");

        assert_ok!(bridge.on_ready("GuildBot", None).await);
        assert_ok!(bridge.broadcast(&chat("hi", ChannelTag::Guild)).await);

        assert!(transport
            .sent()
            .contains(&Sent::CreateWebhook(ChannelId::new(1), "GuildBot".to_string())));
    }

    #[tokio::test]
    async fn test_minecraft_broadcast_sends_image_then_links() {
        let (bridge, transport) = bridge_with_mode("minecraft");

        let event = chat("see https://example.com now", ChannelTag::Guild);
        assert_ok!(bridge.broadcast(&event).await);

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0], Sent::File(_, file) if file.file_name == "Steve.png"));
        assert_eq!(
            sent[1],
            Sent::Text(ChannelId::new(1), "https://example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_debug_placeholder_dropped_outside_minecraft_mode() {
        let (bridge, transport) = bridge_with_mode("bot");
        assert_ok!(bridge.broadcast(&chat(IGNORED_DEBUG_MESSAGE, ChannelTag::Debug)).await);
        assert!(transport.sent().is_empty());

        let (bridge, transport) = bridge_with_mode("minecraft");
        assert_ok!(bridge.broadcast(&chat(IGNORED_DEBUG_MESSAGE, ChannelTag::Debug)).await);
        assert!(matches!(&transport.sent()[0], Sent::File(id, _) if *id == ChannelId::new(4)));
    }

    #[tokio::test]
    async fn test_invalid_mode_halts_broadcast() {
        let (bridge, transport) = bridge_with_mode("fancy");

        let result = bridge.broadcast(&chat("hello", ChannelTag::Guild)).await;
        assert!(matches!(result, Err(BridgeError::InvalidMessageMode { .. })));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_embeds_ignore_invalid_mode() {
        let (bridge, transport) = bridge_with_mode("fancy");

        assert_ok!(
            bridge
                .broadcast_clean_embed("Steve joined the guild!", 0x47F049, ChannelTag::Logger)
                .await
        );
        let icon = Some("https://x/icon.png");
        assert_ok!(
            bridge
                .broadcast_headed_embed("body", "Title", icon, 1, ChannelTag::Guild)
                .await
        );

        let sent = transport.sent();
        assert!(matches!(&sent[0], Sent::Embed(id, embed)
            if *id == ChannelId::new(3) && embed.author.is_none()));
        assert!(matches!(&sent[1], Sent::Embed(_, embed)
            if embed.author.as_ref().map(|a| a.name.as_str()) == Some("Title")));
    }

    #[tokio::test]
    async fn test_player_toggle_webhook_mode() {
        let (bridge, transport) = bridge_with_mode("webhook");
        let event = PresenceEvent {
            full_message: "Guild > Steve joined.".to_string(),
            username: "Steve".to_string(),
            message: "joined.".to_string(),
            color: 0x47F049,
            channel: ChannelTag::Guild,
        };

        assert_ok!(bridge.player_toggle(&event).await);

        let sent = transport.sent();
        let Some(Sent::ExecuteWebhook(_, payload)) = sent.last() else {
            panic!("expected webhook execution, got {:?}", sent);
        };
        assert_eq!(payload.embeds[0].description.as_deref(), Some("Steve joined."));
    }

    #[tokio::test]
    async fn test_on_close_announces_offline() {
        let (bridge, transport) = bridge_with_mode("bot");

        assert_ok!(bridge.on_close().await);

        let Sent::Embed(_, embed) = &transport.sent()[0] else {
            panic!("expected embed");
        };
        assert_eq!(embed.description.as_deref(), Some("Chat Bridge is Offline"));
        assert_eq!(embed.color, Some(OFFLINE_COLOR));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let transport = Arc::new(RecordingTransport::failing());
        let bridge = Bridge::new(&test_config(), transport, make_renderer());

        assert_err!(bridge.broadcast(&chat("hello", ChannelTag::Guild)).await);
    }
}
