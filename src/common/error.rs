//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Errors raised while broadcasting a single message.
///
/// Each variant halts the broadcast it occurred in and nothing else.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid message mode '{mode}': must be bot, webhook or minecraft")]
    InvalidMessageMode { mode: String },

    #[error("Failed to render chat image: {message}")]
    Render { message: String },

    #[error(transparent)]
    Discord(#[from] DiscordError),
}

/// Discord transport errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Failed to send message to channel {channel_id}: {message}")]
    SendFailed { channel_id: u64, message: String },

    #[error("Failed to obtain webhook for channel {channel_id}: {message}")]
    Webhook { channel_id: u64, message: String },

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Chat relay connection errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Kicked from server: {reason}")]
    Kicked { reason: String },

    #[error("Invalid relay frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}

/// Command registration errors.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command '{name}' is registered more than once")]
    DuplicateName { name: String },
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Result type alias for Discord operations.
pub type DiscordResult<T> = std::result::Result<T, DiscordError>;

/// Result type alias for connection operations.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;
