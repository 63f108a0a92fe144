//! Guild chat line classification.
//!
//! Lines arrive with `§` codes; matching runs on the stripped text while
//! the original is kept for image rendering.

use fancy_regex::{Captures, Regex};

use crate::common::{ChannelTag, ChatEvent, PresenceEvent};
use crate::minecraft::format::strip_formatting;

pub const JOINED_COLOR: u32 = 0x47F049;
pub const LEFT_COLOR: u32 = 0xF04947;

/// What a chat line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    /// Guild or officer chat from a player.
    Chat(ChatEvent),
    /// A guild member came online or went offline.
    Presence(PresenceEvent),
    /// A guild membership change, sent as a clean embed.
    GuildEvent { message: String, color: u32 },
}

#[derive(Debug, Clone)]
pub struct ChatParser {
    chat: Regex,
    presence: Regex,
    member_joined: Regex,
    member_left: Regex,
    member_kicked: Regex,
    member_promoted: Regex,
    member_demoted: Regex,
}

impl Default for ChatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatParser {
    pub fn new() -> Self {
        Self {
            chat: Regex::new(
                r"^(Guild|Officer) > (?:\[[^\]]+\] )?(\w{1,16})(?: \[([^\]]+)\])?: (.*)$",
            )
            .unwrap(),
            presence: Regex::new(r"^Guild > (\w{1,16}) (joined|left)\.$").unwrap(),
            member_joined: Regex::new(r"^(?:\[[^\]]+\] )?(\w{1,16}) joined the guild!$").unwrap(),
            member_left: Regex::new(r"^(?:\[[^\]]+\] )?(\w{1,16}) left the guild!$").unwrap(),
            member_kicked: Regex::new(concat!(
                r"^(?:\[[^\]]+\] )?(\w{1,16}) was kicked from the guild by ",
                r"(?:\[[^\]]+\] )?(\w{1,16})!$",
            ))
            .unwrap(),
            member_promoted: Regex::new(
                r"^(?:\[[^\]]+\] )?(\w{1,16}) was promoted from (.+) to (.+)$",
            )
            .unwrap(),
            member_demoted: Regex::new(
                r"^(?:\[[^\]]+\] )?(\w{1,16}) was demoted from (.+) to (.+)$",
            )
            .unwrap(),
        }
    }

    /// Classify one raw line. Lines sent by `bot_username` are dropped.
    pub fn parse(&self, raw: &str, bot_username: Option<&str>) -> Option<ChatLine> {
        let line = strip_formatting(raw);
        let line = line.trim();

        if let Some(caps) = captures(&self.presence, line) {
            let joined = &caps[2] == "joined";
            return Some(ChatLine::Presence(PresenceEvent {
                full_message: raw.to_string(),
                username: caps[1].to_string(),
                message: format!("{}.", &caps[2]),
                color: if joined { JOINED_COLOR } else { LEFT_COLOR },
                channel: ChannelTag::Guild,
            }));
        }

        if let Some(caps) = captures(&self.chat, line) {
            let username = &caps[2];
            if bot_username.is_some_and(|bot| bot.eq_ignore_ascii_case(username)) {
                return None;
            }
            return Some(ChatLine::Chat(ChatEvent {
                full_message: raw.to_string(),
                username: username.to_string(),
                message: caps[4].to_string(),
                guild_rank: caps.get(3).map_or("", |m| m.as_str()).to_string(),
                channel: ChannelTag::parse(&caps[1]),
            }));
        }

        self.guild_event(line)
    }

    fn guild_event(&self, line: &str) -> Option<ChatLine> {
        let event = |message: String, color: u32| Some(ChatLine::GuildEvent { message, color });

        if let Some(caps) = captures(&self.member_joined, line) {
            return event(format!("**{}** joined the guild!", &caps[1]), JOINED_COLOR);
        }
        if let Some(caps) = captures(&self.member_left, line) {
            return event(format!("**{}** left the guild!", &caps[1]), LEFT_COLOR);
        }
        if let Some(caps) = captures(&self.member_kicked, line) {
            return event(
                format!("**{}** was kicked from the guild by **{}**!", &caps[1], &caps[2]),
                LEFT_COLOR,
            );
        }
        if let Some(caps) = captures(&self.member_promoted, line) {
            return event(
                format!("**{}** was promoted from {} to {}", &caps[1], &caps[2], &caps[3]),
                JOINED_COLOR,
            );
        }
        if let Some(caps) = captures(&self.member_demoted, line) {
            return event(
                format!("**{}** was demoted from {} to {}", &caps[1], &caps[2], &caps[3]),
                LEFT_COLOR,
            );
        }
        None
    }
}

fn captures<'t>(pattern: &Regex, line: &'t str) -> Option<Captures<'t>> {
    pattern.captures(line).ok().flatten()
}
