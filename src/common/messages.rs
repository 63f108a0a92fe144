//! Canonical message types for bridge communication.
//!
//! This module defines the single source of truth for message types
//! used in communication between Discord and Minecraft.

/// Logical destination of a broadcast.
///
/// The set is closed; anything unrecognised parses as `Guild`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelTag {
    /// Guild chat channel (the default destination).
    #[default]
    Guild,
    /// Officer chat channel.
    Officer,
    /// Guild event log channel.
    Logger,
    /// Console debug channel.
    Debug,
}

impl ChannelTag {
    /// Parse a tag name. Never fails.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "Officer" => ChannelTag::Officer,
            "Logger" => ChannelTag::Logger,
            "debugChannel" => ChannelTag::Debug,
            _ => ChannelTag::Guild,
        }
    }

    /// The in-game chat command that writes to this channel.
    pub fn game_chat_command(&self) -> &'static str {
        match self {
            ChannelTag::Officer => "/oc",
            _ => "/gc",
        }
    }
}

/// A chat line to broadcast to Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// The complete line as the game formatted it (with `§` codes).
    pub full_message: String,
    pub username: String,
    pub message: String,
    pub guild_rank: String,
    pub channel: ChannelTag,
}

/// A join/leave notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEvent {
    pub full_message: String,
    pub username: String,
    /// Action text, e.g. "joined." or "left.".
    pub message: String,
    pub color: u32,
    pub channel: ChannelTag,
}

/// Chat line to send into the game (Discord -> Minecraft).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingGameMessage {
    /// The full line including its chat command, e.g. "/gc Steve: hi".
    pub content: String,
}

/// Events surfaced by the Minecraft relay connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The relay logged into the server as this player.
    LoggedIn { username: String },
    /// A raw chat line (may contain `§` formatting codes).
    Chat { message: String },
    /// The relay was kicked from the server.
    Kicked { reason: String },
    /// Connection to the relay was lost.
    Disconnected,
}
