//! Configuration file parsing (HOCON format).

use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::types::Config;
use hocon::HoconLoader;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
#[cfg(test)]
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_str(
            r#"
            discord {
                token = "abc"
                server_id = 10
                guild_chat_channel = 11
                officer_channel = 12
                logging_channel = 13
            }
            minecraft {
                relay { host = "localhost", port = 25580 }
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.guild_chat_channel, 11);
        assert_eq!(config.discord.prefix, "!");
        assert_eq!(config.discord.message_mode, "bot");
        assert_eq!(config.minecraft.relay.port, 25580);
        assert_eq!(config.console.max_event_size, 1000);
        assert!(config.console.debug_channel.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let config = load_config_str(
            r#"
            discord {
                token = "abc"
                server_id = 10
                guild_chat_channel = 11
                officer_channel = 12
                logging_channel = 13
                command_role = 14
                prefix = "?"
                message_mode = "webhook"
            }
            minecraft {
                relay { host = "relay", port = 4000 }
                prefix = "-"
                discord_invite = "https://discord.gg/example"
            }
            console {
                debug_channel = 15
                max_event_size = 250
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.command_role, Some(14));
        assert_eq!(config.discord.prefix, "?");
        assert_eq!(config.discord.message_mode, "webhook");
        assert_eq!(config.minecraft.prefix, "-");
        assert_eq!(config.console.debug_channel, Some(15));
        assert_eq!(config.console.max_event_size, 250);
    }

    #[test]
    fn test_missing_section_fails() {
        let result = load_config_str("discord { token = \"abc\" }");
        assert!(result.is_err());
    }
}
