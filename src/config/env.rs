//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `GUILDHALL_DISCORD_TOKEN` - Discord bot token
//! - `GUILDHALL_MESSAGE_MODE` - Message mode (bot, webhook, minecraft)
//! - `GUILDHALL_RELAY_HOST` - Chat relay host
//! - `GUILDHALL_RELAY_PORT` - Chat relay port

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "GUILDHALL";

/// Apply environment variable overrides to a config.
///
/// This allows the bot token to be provided via the environment
/// instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }
    if let Ok(mode) = env::var(format!("{}_MESSAGE_MODE", ENV_PREFIX)) {
        config.discord.message_mode = mode;
    }

    // Relay endpoint
    if let Ok(host) = env::var(format!("{}_RELAY_HOST", ENV_PREFIX)) {
        config.minecraft.relay.host = host;
    }
    if let Ok(port) = env::var(format!("{}_RELAY_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.minecraft.relay.port = port;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `GUILDHALL_CONFIG` environment variable, otherwise returns "guildhall.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "guildhall.conf".to_string())
}
