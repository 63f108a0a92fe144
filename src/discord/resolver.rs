//! Discord markup to Minecraft text resolution.
//!
//! Minecraft chat shows none of Discord's markup, so mentions become
//! `@name`/`#name` and emojis become `:shortcode:`.

use emojis;
use fancy_regex::Regex;
use serenity::cache::Cache;
use serenity::model::id::{ChannelId, RoleId, UserId};

/// Name lookups needed to resolve mentions.
pub trait MentionNames {
    fn user_name(&self, id: u64) -> Option<String>;
    fn channel_name(&self, id: u64) -> Option<String>;
    fn role_name(&self, id: u64) -> Option<String>;
}

impl MentionNames for Cache {
    fn user_name(&self, id: u64) -> Option<String> {
        let user = self.user(UserId::new(id))?;
        Some(user.name.clone())
    }

    fn channel_name(&self, id: u64) -> Option<String> {
        let channel_id = ChannelId::new(id);
        self.guilds().into_iter().find_map(|guild_id| {
            let guild = self.guild(guild_id)?;
            let channel = guild.channels.get(&channel_id)?;
            Some(channel.name.clone())
        })
    }

    fn role_name(&self, id: u64) -> Option<String> {
        let role_id = RoleId::new(id);
        self.guilds().into_iter().find_map(|guild_id| {
            let guild = self.guild(guild_id)?;
            let role = guild.roles.get(&role_id)?;
            Some(role.name.clone())
        })
    }
}

/// Message resolver for Discord -> Minecraft translation.
#[derive(Debug, Clone)]
pub struct MessageResolver {
    /// Pattern for Discord user mentions (<@123> or <@!123>).
    mention_pattern: Regex,
    /// Pattern for Discord channel mentions (<#123>).
    channel_pattern: Regex,
    /// Pattern for Discord role mentions (<@&123>).
    role_pattern: Regex,
    /// Pattern for Discord custom emojis (<:name:id> or <a:name:id>).
    emoji_pattern: Regex,
}

impl Default for MessageResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageResolver {
    pub fn new() -> Self {
        Self {
            mention_pattern: Regex::new(r"<@!?(\d+)>").unwrap(),
            channel_pattern: Regex::new(r"<#(\d+)>").unwrap(),
            role_pattern: Regex::new(r"<@&(\d+)>").unwrap(),
            emoji_pattern: Regex::new(r"<a?:([a-zA-Z0-9_]+):\d+>").unwrap(),
        }
    }

    fn replace_ids(
        pattern: &Regex,
        message: &str,
        lookup: impl Fn(u64) -> Option<String>,
        sigil: char,
    ) -> String {
        pattern
            .replace_all(message, |caps: &fancy_regex::Captures| -> String {
                caps[1]
                    .parse::<u64>()
                    .ok()
                    .filter(|id| *id != 0)
                    .and_then(&lookup)
                    .map(|name| format!("{}{}", sigil, name))
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .to_string()
    }

    /// Convert <@123456789> to @username.
    pub fn resolve_mentions_to_text(&self, message: &str, names: &dyn MentionNames) -> String {
        Self::replace_ids(&self.mention_pattern, message, |id| names.user_name(id), '@')
    }

    /// Convert <#123> to #channel.
    pub fn resolve_channel_mentions(&self, message: &str, names: &dyn MentionNames) -> String {
        Self::replace_ids(&self.channel_pattern, message, |id| names.channel_name(id), '#')
    }

    /// Convert <@&123> to @role.
    pub fn resolve_role_mentions(&self, message: &str, names: &dyn MentionNames) -> String {
        Self::replace_ids(&self.role_pattern, message, |id| names.role_name(id), '@')
    }

    /// Convert Discord custom emojis to text representation.
    pub fn resolve_custom_emojis_to_text(&self, message: &str) -> String {
        self.emoji_pattern.replace_all(message, ":$1:").to_string()
    }

    /// Convert Unicode emojis to text aliases (e.g., 😀 -> :grinning:).
    ///
    /// Uses shortcode if available (like :joy:, :thumbsup:), otherwise falls back to name.
    pub fn resolve_unicode_emojis_to_text(&self, message: &str) -> String {
        let mut result = String::with_capacity(message.len() * 2);
        let mut chars = message.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch.is_ascii() {
                result.push(ch);
                continue;
            }

            // Two-scalar emojis (variation selectors, flags) first
            if let Some(&next) = chars.peek() {
                if !next.is_ascii() {
                    let pair: String = [ch, next].iter().collect();
                    if let Some(emoji) = emojis::get(&pair) {
                        chars.next();
                        push_alias(&mut result, emoji);
                        continue;
                    }
                }
            }

            match emojis::get(ch.encode_utf8(&mut [0; 4])) {
                Some(emoji) => push_alias(&mut result, emoji),
                None => result.push(ch),
            }
        }

        result
    }

    /// Process a message from Discord for Minecraft.
    pub fn process_discord_to_minecraft(&self, message: &str, names: &dyn MentionNames) -> String {
        let step1 = self.resolve_unicode_emojis_to_text(message);
        let step2 = self.resolve_role_mentions(&step1, names);
        let step3 = self.resolve_mentions_to_text(&step2, names);
        let step4 = self.resolve_channel_mentions(&step3, names);
        self.resolve_custom_emojis_to_text(&step4)
    }
}

fn push_alias(result: &mut String, emoji: &emojis::Emoji) {
    let alias = emoji.shortcode().unwrap_or_else(|| emoji.name());
    result.push(':');
    result.push_str(alias);
    result.push(':');
}
