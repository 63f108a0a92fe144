//! Minecraft side of the bridge: relay connection, chat parsing and
//! in-game commands.

pub mod chat;
pub mod commands;
pub mod connector;
pub mod format;
pub mod handler;

pub use connector::MinecraftConnector;
pub use handler::MinecraftHandler;
