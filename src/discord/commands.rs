//! Discord bot commands (!help, !online, !kick, etc).
//!
//! Guild management commands are forwarded to the game as `/g ...` lines.
//! Everything except `help` and `online` is restricted to staff.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::ChannelId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::commands::{help_lines, CommandHandler, CommandSummary, Invocation, Registry};
use crate::common::OutgoingGameMessage;
use crate::discord::transport::DiscordTransport;
use crate::render::EmbedPayload;

const SUCCESS_COLOR: u32 = 0x47F049;
const ERROR_COLOR: u32 = 0xF04947;
const HELP_COLOR: u32 = 3447003;

const HELP_ALIASES: &[&str] = &["h"];
const HELP_DESCRIPTION: &str = "Show this help message";

/// Per-message state handed to Discord command handlers.
pub struct DiscordCommandContext<T: DiscordTransport> {
    pub transport: Arc<T>,
    /// Channel the command was typed in; replies go here.
    pub channel_id: ChannelId,
    pub game_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    /// Author holds the command role or is the admin.
    pub is_staff: bool,
}

impl<T: DiscordTransport> DiscordCommandContext<T> {
    async fn reply(&self, description: String, color: u32) -> anyhow::Result<()> {
        let embed = EmbedPayload {
            color: Some(color),
            description: Some(description),
            ..EmbedPayload::default()
        };
        self.transport.send_embed(self.channel_id, &embed).await?;
        Ok(())
    }
}

/// A command that becomes one in-game line.
struct GuildCommand {
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    /// Argument synopsis shown on misuse.
    usage: &'static str,
    min_args: usize,
    staff_only: bool,
    build: fn(&Invocation) -> String,
    prefix: String,
}

impl GuildCommand {
    fn usage_line(&self) -> String {
        if self.usage.is_empty() {
            format!("{}{}", self.prefix, self.name)
        } else {
            format!("{}{} {}", self.prefix, self.name, self.usage)
        }
    }
}

#[async_trait]
impl<T: DiscordTransport> CommandHandler<DiscordCommandContext<T>> for GuildCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn on_command(
        &self,
        ctx: &DiscordCommandContext<T>,
        invocation: &Invocation,
    ) -> anyhow::Result<()> {
        if self.staff_only && !ctx.is_staff {
            debug!(command = self.name, actor = invocation.actor, "Rejected non-staff command");
            return ctx
                .reply("You do not have permission to run this command.".to_string(), ERROR_COLOR)
                .await;
        }

        if invocation.args.len() < self.min_args {
            return ctx
                .reply(format!("Usage: `{}`", self.usage_line()), ERROR_COLOR)
                .await;
        }

        let line = (self.build)(invocation);
        if ctx
            .game_tx
            .send(OutgoingGameMessage {
                content: line.clone(),
            })
            .is_err()
        {
            warn!("Game channel closed, dropping command: {}", line);
            return ctx
                .reply("Error: Not connected to Minecraft.".to_string(), ERROR_COLOR)
                .await;
        }

        ctx.reply(format!("Sent `{}`", line), SUCCESS_COLOR).await
    }
}

/// `!help`: lists every Discord command.
struct HelpCommand {
    lines: Vec<String>,
}

#[async_trait]
impl<T: DiscordTransport> CommandHandler<DiscordCommandContext<T>> for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn aliases(&self) -> &'static [&'static str] {
        HELP_ALIASES
    }

    fn description(&self) -> &'static str {
        HELP_DESCRIPTION
    }

    async fn on_command(
        &self,
        ctx: &DiscordCommandContext<T>,
        _invocation: &Invocation,
    ) -> anyhow::Result<()> {
        let body = format!("**Available Commands:**\n{}", self.lines.join("\n"));
        ctx.reply(body, HELP_COLOR).await
    }
}

fn guild_commands(prefix: &str) -> Vec<GuildCommand> {
    let command = |name: &'static str,
                   aliases: &'static [&'static str],
                   description: &'static str,
                   usage: &'static str,
                   min_args: usize,
                   staff_only: bool,
                   build: fn(&Invocation) -> String| GuildCommand {
        name,
        aliases,
        description,
        usage,
        min_args,
        staff_only,
        build,
        prefix: prefix.to_string(),
    };

    vec![
        command(
            "online",
            &["list", "who"],
            "List online guild members in game",
            "",
            0,
            false,
            |_| "/g online".to_string(),
        ),
        command(
            "invite",
            &["inv"],
            "Invite a player to the guild",
            "<player>",
            1,
            true,
            |inv| format!("/g invite {}", inv.args[0]),
        ),
        command(
            "kick",
            &["k"],
            "Kick a player from the guild",
            "<player> [reason]",
            1,
            true,
            |inv| {
                let reason = inv.args[1..].join(" ");
                if reason.is_empty() {
                    format!("/g kick {}", inv.args[0])
                } else {
                    format!("/g kick {} {}", inv.args[0], reason)
                }
            },
        ),
        command(
            "promote",
            &[],
            "Promote a guild member",
            "<player>",
            1,
            true,
            |inv| format!("/g promote {}", inv.args[0]),
        ),
        command(
            "demote",
            &[],
            "Demote a guild member",
            "<player>",
            1,
            true,
            |inv| format!("/g demote {}", inv.args[0]),
        ),
        command(
            "setrank",
            &[],
            "Set a guild member's rank",
            "<player> <rank>",
            2,
            true,
            |inv| format!("/g setrank {} {}", inv.args[0], inv.args[1..].join(" ")),
        ),
        command(
            "override",
            &["o", "cmd"],
            "Run a raw command as the bot",
            "<command>",
            1,
            true,
            |inv| format!("/{}", inv.rest()),
        ),
    ]
}

/// Every Discord command, in registration order.
pub fn registry<T: DiscordTransport + 'static>(prefix: &str) -> Registry<DiscordCommandContext<T>> {
    let mut registry: Registry<DiscordCommandContext<T>> = Vec::new();
    for command in guild_commands(prefix) {
        registry.push(Box::new(command));
    }

    let mut summaries = vec![CommandSummary {
        name: "help",
        aliases: HELP_ALIASES,
        description: HELP_DESCRIPTION,
    }];
    summaries.extend(registry.iter().map(|handler| CommandSummary::of(handler.as_ref())));

    registry.insert(
        0,
        Box::new(HelpCommand {
            lines: help_lines(prefix, &summaries),
        }),
    );
    registry
}
