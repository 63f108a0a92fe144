//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;
use crate::render::MessageMode;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }

    if config.discord.server_id == 0 {
        errors.push("discord.server_id must be a non-zero server id".to_string());
    }

    let channels = [
        ("discord.guild_chat_channel", config.discord.guild_chat_channel),
        ("discord.officer_channel", config.discord.officer_channel),
        ("discord.logging_channel", config.discord.logging_channel),
    ];
    for (field, id) in channels {
        if id == 0 {
            errors.push(format!("{} must be a non-zero channel id", field));
        }
    }
    if config.console.debug_channel == Some(0) {
        errors.push("console.debug_channel must be a non-zero channel id".to_string());
    }

    if let Err(e) = MessageMode::parse(&config.discord.message_mode) {
        errors.push(format!("discord.message_mode: {}", e));
    }

    if config.discord.prefix.is_empty() {
        errors.push("discord.prefix must not be empty".to_string());
    }
    if config.minecraft.prefix.is_empty() {
        errors.push("minecraft.prefix must not be empty".to_string());
    }

    // Validate relay endpoint
    if config.minecraft.relay.host.is_empty() {
        errors.push("minecraft.relay.host is required".to_string());
    }
    if config.minecraft.relay.port == 0 {
        errors.push("minecraft.relay.port must be non-zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            message: errors.join("\n"),
        })
    }
}
