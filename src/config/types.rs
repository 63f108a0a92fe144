//! Configuration type definitions.

use serde::Deserialize;

/// Default avatar service; `{username}` is replaced with the player name.
pub const DEFAULT_AVATAR_URL: &str = "https://www.mc-heads.net/avatar/{username}";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub minecraft: MinecraftConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    pub server_id: u64,
    pub guild_chat_channel: u64,
    pub officer_channel: u64,
    pub logging_channel: u64,
    /// Role allowed to run staff commands.
    pub command_role: Option<u64>,
    /// User allowed to run staff commands regardless of roles.
    pub admin_id: Option<u64>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// One of "bot", "webhook" or "minecraft". Parsed at dispatch time.
    #[serde(default = "default_message_mode")]
    pub message_mode: String,
    #[serde(default = "default_avatar_url")]
    pub avatar_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            server_id: 0,
            guild_chat_channel: 0,
            officer_channel: 0,
            logging_channel: 0,
            command_role: None,
            admin_id: None,
            prefix: default_prefix(),
            message_mode: default_message_mode(),
            avatar_url: default_avatar_url(),
        }
    }
}

/// Minecraft side configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MinecraftConfig {
    pub relay: RelayConfig,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Invite link advertised by the in-game `!discord` command.
    pub discord_invite: Option<String>,
}

impl Default for MinecraftConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            prefix: default_prefix(),
            discord_invite: None,
        }
    }
}

/// Chat relay endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 25580,
        }
    }
}

/// Console/logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    pub debug_channel: Option<u64>,
    /// Events at or above this length are sent but not logged.
    #[serde(default = "default_max_event_size")]
    pub max_event_size: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            debug_channel: None,
            max_event_size: default_max_event_size(),
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_message_mode() -> String {
    "bot".to_string()
}

fn default_avatar_url() -> String {
    DEFAULT_AVATAR_URL.to_string()
}

fn default_max_event_size() -> usize {
    1000
}
