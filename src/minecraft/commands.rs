//! In-game bot commands (!help, !discord, !ping).
//!
//! Replies are typed back into the chat the command came from.

use anyhow::Context as _;
use serenity::async_trait;
use tokio::sync::mpsc;

use crate::commands::{CommandHandler, CommandSummary, Invocation, Registry};
use crate::common::{ChannelTag, OutgoingGameMessage};

/// Per-line state handed to in-game command handlers.
pub struct MinecraftCommandContext {
    pub game_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    /// Chat the command was typed in.
    pub channel: ChannelTag,
    pub discord_invite: Option<String>,
}

impl MinecraftCommandContext {
    fn reply(&self, text: &str) -> anyhow::Result<()> {
        self.game_tx
            .send(OutgoingGameMessage {
                content: format!("{} {}", self.channel.game_chat_command(), text),
            })
            .context("Game channel closed")
    }
}

struct HelpCommand {
    line: String,
}

#[async_trait]
impl CommandHandler<MinecraftCommandContext> for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["commands"]
    }

    fn description(&self) -> &'static str {
        "List bot commands"
    }

    async fn on_command(
        &self,
        ctx: &MinecraftCommandContext,
        _invocation: &Invocation,
    ) -> anyhow::Result<()> {
        ctx.reply(&self.line)
    }
}

struct DiscordCommand;

#[async_trait]
impl CommandHandler<MinecraftCommandContext> for DiscordCommand {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["dc"]
    }

    fn description(&self) -> &'static str {
        "Show the Discord invite"
    }

    async fn on_command(
        &self,
        ctx: &MinecraftCommandContext,
        _invocation: &Invocation,
    ) -> anyhow::Result<()> {
        match &ctx.discord_invite {
            Some(invite) => ctx.reply(&format!("Join our Discord: {}", invite)),
            None => ctx.reply("No Discord invite is configured."),
        }
    }
}

struct PingCommand;

#[async_trait]
impl CommandHandler<MinecraftCommandContext> for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "Check that the bridge is alive"
    }

    async fn on_command(
        &self,
        ctx: &MinecraftCommandContext,
        _invocation: &Invocation,
    ) -> anyhow::Result<()> {
        ctx.reply("Pong!")
    }
}

/// Every in-game command, in registration order.
pub fn registry(prefix: &str) -> Registry<MinecraftCommandContext> {
    let mut registry: Registry<MinecraftCommandContext> = Vec::new();
    registry.push(Box::new(DiscordCommand));
    registry.push(Box::new(PingCommand));

    let names = std::iter::once("help")
        .chain(registry.iter().map(|handler| CommandSummary::of(handler.as_ref()).name))
        .map(|name| format!("{}{}", prefix, name))
        .collect::<Vec<_>>();

    registry.insert(
        0,
        Box::new(HelpCommand {
            line: format!("Commands: {}", names.join(", ")),
        }),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandRouter;
    use tokio_test::{assert_err, assert_ok};

    fn context(
        channel: ChannelTag,
        invite: Option<&str>,
    ) -> (MinecraftCommandContext, mpsc::UnboundedReceiver<OutgoingGameMessage>) {
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        let ctx = MinecraftCommandContext {
            game_tx,
            channel,
            discord_invite: invite.map(str::to_string),
        };
        (ctx, game_rx)
    }

    #[tokio::test]
    async fn test_ping_replies_in_same_chat() {
        let router = CommandRouter::new("!", registry("!")).unwrap();

        let (ctx, mut rx) = context(ChannelTag::Officer, None);
        assert!(assert_ok!(router.handle(&ctx, "Steve", "!ping").await));
        assert_eq!(rx.try_recv().unwrap().content, "/oc Pong!");

        let (ctx, mut rx) = context(ChannelTag::Guild, None);
        assert!(assert_ok!(router.handle(&ctx, "Steve", "!ping").await));
        assert_eq!(rx.try_recv().unwrap().content, "/gc Pong!");
    }

    #[tokio::test]
    async fn test_discord_invite() {
        let router = CommandRouter::new("!", registry("!")).unwrap();

        let (ctx, mut rx) = context(ChannelTag::Guild, Some("https://discord.gg/abc"));
        assert!(assert_ok!(router.handle(&ctx, "Steve", "!dc").await));
        assert_eq!(
            rx.try_recv().unwrap().content,
            "/gc Join our Discord: https://discord.gg/abc"
        );

        let (ctx, mut rx) = context(ChannelTag::Guild, None);
        assert!(assert_ok!(router.handle(&ctx, "Steve", "!discord").await));
        assert_eq!(
            rx.try_recv().unwrap().content,
            "/gc No Discord invite is configured."
        );
    }

    #[tokio::test]
    async fn test_help_lists_commands() {
        let router = CommandRouter::new("!", registry("!")).unwrap();
        let (ctx, mut rx) = context(ChannelTag::Guild, None);

        assert!(assert_ok!(router.handle(&ctx, "Steve", "!commands").await));
        assert_eq!(rx.try_recv().unwrap().content, "/gc Commands: !help, !discord, !ping");
    }

    #[test]
    fn test_help_covers_every_registered_command() {
        let registry = registry("?");
        let help = CommandRouter::new("?", registry).unwrap();
        let (ctx, mut rx) = context(ChannelTag::Guild, None);

        tokio_test::block_on(help.handle(&ctx, "Steve", "?help")).unwrap();
        let line = rx.try_recv().unwrap().content;

        for handler in registry_names("?") {
            assert!(line.contains(&handler), "{} missing from {:?}", handler, line);
        }
    }

    fn registry_names(prefix: &str) -> Vec<String> {
        registry(prefix)
            .iter()
            .map(|handler| format!("{}{}", prefix, handler.name()))
            .collect()
    }

    #[tokio::test]
    async fn test_closed_game_channel_is_an_error() {
        let router = CommandRouter::new("!", registry("!")).unwrap();
        let (ctx, rx) = context(ChannelTag::Guild, None);
        drop(rx);

        assert_err!(router.handle(&ctx, "Steve", "!ping").await);
    }
}
