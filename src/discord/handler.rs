//! Discord message event handling.
//!
//! Dispatches Discord commands and relays guild and officer chat into
//! the game.

use std::sync::Arc;

use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::bridge::Bridge;
use crate::commands::CommandRouter;
use crate::common::error::CommandError;
use crate::common::{ChannelTag, OutgoingGameMessage};
use crate::config::types::Config;
use crate::discord::commands::{registry, DiscordCommandContext};
use crate::discord::resolver::{MentionNames, MessageResolver};
use crate::discord::transport::DiscordTransport;
use crate::minecraft::format::{split_chat, MAX_CHAT_LENGTH};

/// The parts of a Discord message the handler looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub author_id: UserId,
    /// Server nickname, else global name, else username.
    pub author_name: String,
    pub author_is_bot: bool,
    /// Role ids of the author in this guild.
    pub author_roles: Vec<RoleId>,
    /// Server the message was posted in, `None` for DMs.
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub content: String,
    pub attachment_urls: Vec<String>,
}

impl From<&Message> for IncomingMessage {
    fn from(message: &Message) -> Self {
        let author_name = message
            .member
            .as_ref()
            .and_then(|member| member.nick.clone())
            .or_else(|| message.author.global_name.clone())
            .unwrap_or_else(|| message.author.name.clone());

        Self {
            author_id: message.author.id,
            author_name,
            author_is_bot: message.author.bot,
            author_roles: message
                .member
                .as_ref()
                .map(|member| member.roles.clone())
                .unwrap_or_default(),
            guild_id: message.guild_id,
            channel_id: message.channel_id,
            content: message.content.clone(),
            attachment_urls: message.attachments.iter().map(|a| a.url.clone()).collect(),
        }
    }
}

/// Discord event handler.
pub struct DiscordMessageHandler<T: DiscordTransport + 'static> {
    bridge: Arc<Bridge<T>>,
    router: CommandRouter<DiscordCommandContext<T>>,
    resolver: MessageResolver,
    server_id: Option<GuildId>,
    game_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    command_role: Option<RoleId>,
    admin_id: Option<UserId>,
}

impl<T: DiscordTransport + 'static> DiscordMessageHandler<T> {
    pub fn new(
        config: &Config,
        bridge: Arc<Bridge<T>>,
        game_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    ) -> Result<Self, CommandError> {
        let prefix = config.discord.prefix.as_str();
        Ok(Self {
            bridge,
            router: CommandRouter::new(prefix, registry(prefix))?,
            resolver: MessageResolver::new(),
            server_id: Some(config.discord.server_id).filter(|id| *id != 0).map(GuildId::new),
            game_tx,
            command_role: config.discord.command_role.filter(|id| *id != 0).map(RoleId::new),
            admin_id: config.discord.admin_id.filter(|id| *id != 0).map(UserId::new),
        })
    }

    fn is_staff(&self, message: &IncomingMessage) -> bool {
        self.admin_id == Some(message.author_id)
            || self
                .command_role
                .map_or(false, |role| message.author_roles.contains(&role))
    }

    /// Handle one message. `self_id` is the bot's own user id.
    pub async fn handle_message(
        &self,
        message: IncomingMessage,
        self_id: UserId,
        names: &(dyn MentionNames + Sync),
    ) {
        if message.author_id == self_id || message.author_is_bot {
            return;
        }
        // DMs and other servers the bot sits in
        if message.guild_id.is_none() || message.guild_id != self.server_id {
            debug!(guild = ?message.guild_id, "Ignoring message from outside the server");
            return;
        }

        let content = message.content.trim();
        if content.is_empty() && message.attachment_urls.is_empty() {
            return;
        }

        let ctx = DiscordCommandContext {
            transport: self.bridge.transport(),
            channel_id: message.channel_id,
            game_tx: self.game_tx.clone(),
            is_staff: self.is_staff(&message),
        };
        match self.router.handle(&ctx, &message.author_name, content).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                error!("Command handler error: {}", e);
                return;
            }
        }

        let Some(tag) = self.bridge.resolver().relay_tag(message.channel_id) else {
            return;
        };

        for line in self.relay_lines(&message, tag, names) {
            info!(kind = "Minecraft", "Discord -> Minecraft: {}", line.content);
            if let Err(e) = self.game_tx.send(line) {
                error!("Failed to send message to Minecraft: {}", e);
                return;
            }
        }
    }

    /// Game chat lines for a relayed Discord message.
    pub fn relay_lines(
        &self,
        message: &IncomingMessage,
        tag: ChannelTag,
        names: &dyn MentionNames,
    ) -> Vec<OutgoingGameMessage> {
        let mut content = self
            .resolver
            .process_discord_to_minecraft(message.content.trim(), names);
        for url in &message.attachment_urls {
            if !content.is_empty() {
                content.push(' ');
            }
            content.push_str(url);
        }
        // Minecraft rejects the section sign in chat
        let content = content.replace('§', "");

        let command = tag.game_chat_command();
        let line = format!("{}: {}", message.author_name, content);
        let budget = MAX_CHAT_LENGTH - command.len() - 1;

        let pieces = split_chat(&line, budget);
        debug!(pieces = pieces.len(), "Relaying Discord message");
        pieces
            .into_iter()
            .map(|piece| OutgoingGameMessage {
                content: format!("{} {}", command, piece),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::resolver::tests::test_config;
    use crate::discord::resolver::tests::StaticNames;
    use crate::discord::transport::tests::{RecordingTransport, Sent};
    use crate::render::tests::make_renderer;

    const BOT_ID: u64 = 999;
    const SERVER_ID: u64 = 100;

    struct Harness {
        handler: DiscordMessageHandler<RecordingTransport>,
        transport: Arc<RecordingTransport>,
        game_rx: mpsc::UnboundedReceiver<OutgoingGameMessage>,
    }

    fn harness() -> Harness {
        let mut config = test_config();
        config.discord.command_role = Some(50);
        config.discord.admin_id = Some(60);

        let transport = Arc::new(RecordingTransport::default());
        let bridge = Arc::new(Bridge::new(&config, Arc::clone(&transport), make_renderer()));
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        Harness {
            handler: DiscordMessageHandler::new(&config, bridge, game_tx).unwrap(),
            transport,
            game_rx,
        }
    }

    fn message(channel: u64, content: &str) -> IncomingMessage {
        IncomingMessage {
            author_id: UserId::new(10),
            author_name: "Alex".to_string(),
            author_is_bot: false,
            author_roles: Vec::new(),
            guild_id: Some(GuildId::new(SERVER_ID)),
            channel_id: ChannelId::new(channel),
            content: content.to_string(),
            attachment_urls: Vec::new(),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutgoingGameMessage>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line.content);
        }
        lines
    }

    #[tokio::test]
    async fn test_guild_chat_relays_with_gc() {
        let mut h = harness();
        h.handler
            .handle_message(message(1, "hello <@42>"), UserId::new(BOT_ID), &StaticNames::default())
            .await;
        assert_eq!(drain(&mut h.game_rx), vec!["/gc Alex: hello <@42>"]);
    }

    #[tokio::test]
    async fn test_officer_chat_relays_with_oc() {
        let mut h = harness();
        h.handler
            .handle_message(message(2, "psst"), UserId::new(BOT_ID), &StaticNames::default())
            .await;
        assert_eq!(drain(&mut h.game_rx), vec!["/oc Alex: psst"]);
    }

    #[tokio::test]
    async fn test_other_channels_are_not_relayed() {
        let mut h = harness();
        h.handler
            .handle_message(message(3, "log chatter"), UserId::new(BOT_ID), &StaticNames::default())
            .await;
        assert!(drain(&mut h.game_rx).is_empty());
    }

    #[tokio::test]
    async fn test_bots_self_and_dms_ignored() {
        let mut h = harness();
        let names = StaticNames::default();

        let mut from_bot = message(1, "beep");
        from_bot.author_is_bot = true;
        h.handler.handle_message(from_bot, UserId::new(BOT_ID), &names).await;

        let mut from_self = message(1, "echo");
        from_self.author_id = UserId::new(BOT_ID);
        h.handler.handle_message(from_self, UserId::new(BOT_ID), &names).await;

        let mut direct = message(1, "dm");
        direct.guild_id = None;
        h.handler.handle_message(direct, UserId::new(BOT_ID), &names).await;

        assert!(drain(&mut h.game_rx).is_empty());
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_other_servers_are_ignored() {
        let mut h = harness();
        let names = StaticNames::default();

        let mut elsewhere = message(1, "hello");
        elsewhere.guild_id = Some(GuildId::new(SERVER_ID + 1));
        h.handler.handle_message(elsewhere, UserId::new(BOT_ID), &names).await;

        let mut command = message(1, "!online");
        command.guild_id = Some(GuildId::new(SERVER_ID + 1));
        h.handler.handle_message(command, UserId::new(BOT_ID), &names).await;

        assert!(drain(&mut h.game_rx).is_empty());
        assert!(h.transport.sent().is_empty());

        h.handler.handle_message(message(1, "hello"), UserId::new(BOT_ID), &names).await;
        assert_eq!(drain(&mut h.game_rx), vec!["/gc Alex: hello"]);
    }

    #[tokio::test]
    async fn test_attachments_are_appended() {
        let h = harness();
        let mut msg = message(1, "look");
        msg.attachment_urls = vec!["https://cdn.example/a.png".to_string()];

        let lines = h.handler.relay_lines(&msg, ChannelTag::Guild, &StaticNames::default());
        assert_eq!(lines[0].content, "/gc Alex: look https://cdn.example/a.png");
    }

    #[tokio::test]
    async fn test_long_messages_fit_chat_limit() {
        let h = harness();
        let text = "word ".repeat(120);
        let lines = h
            .handler
            .relay_lines(&message(1, &text), ChannelTag::Guild, &StaticNames::default());

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.content.starts_with("/gc "));
            assert!(line.content.chars().count() <= MAX_CHAT_LENGTH);
        }
    }

    #[tokio::test]
    async fn test_commands_are_not_relayed() {
        let mut h = harness();
        h.handler
            .handle_message(message(1, "!online"), UserId::new(BOT_ID), &StaticNames::default())
            .await;

        assert_eq!(drain(&mut h.game_rx), vec!["/g online"]);
        assert!(matches!(h.transport.sent().last(), Some(Sent::Embed(..))));
    }

    #[tokio::test]
    async fn test_staff_by_role_or_admin() {
        let h = harness();
        let mut by_role = message(1, "");
        by_role.author_roles = vec![RoleId::new(50)];
        assert!(h.handler.is_staff(&by_role));

        let mut admin = message(1, "");
        admin.author_id = UserId::new(60);
        assert!(h.handler.is_staff(&admin));

        assert!(!h.handler.is_staff(&message(1, "")));
    }
}
