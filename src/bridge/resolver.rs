//! Channel tag resolution.

use serenity::model::id::ChannelId;

use crate::common::ChannelTag;
use crate::config::types::Config;

/// Resolves logical channel tags to configured Discord channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelResolver {
    guild_chat: ChannelId,
    officer: ChannelId,
    logging: ChannelId,
    debug: Option<ChannelId>,
}

impl ChannelResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            guild_chat: ChannelId::new(config.discord.guild_chat_channel),
            officer: ChannelId::new(config.discord.officer_channel),
            logging: ChannelId::new(config.discord.logging_channel),
            debug: config.console.debug_channel.filter(|id| *id != 0).map(ChannelId::new),
        }
    }

    /// Destination channel for a tag. Never fails.
    pub fn resolve(&self, tag: ChannelTag) -> ChannelId {
        match tag {
            ChannelTag::Guild => self.guild_chat,
            ChannelTag::Officer => self.officer,
            ChannelTag::Logger => self.logging,
            ChannelTag::Debug => self.debug.unwrap_or(self.guild_chat),
        }
    }

    /// Tag of a Discord channel that relays into the game, if any.
    pub fn relay_tag(&self, channel_id: ChannelId) -> Option<ChannelTag> {
        if channel_id == self.guild_chat {
            Some(ChannelTag::Guild)
        } else if channel_id == self.officer {
            Some(ChannelTag::Officer)
        } else {
            None
        }
    }
}
