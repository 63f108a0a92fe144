//! Discord side of the bridge.
//!
//! ## Module Structure
//!
//! - `client`: Gateway client and event loop (`DiscordBot`)
//! - `commands`: Discord command registry
//! - `handler`: Message handling and relay into the game
//! - `resolver`: Discord markup to plain text
//! - `transport`: REST delivery seam used by the bridge

pub mod client;
pub mod commands;
pub mod handler;
pub mod resolver;
pub mod transport;

pub use client::{build_reqwest_client, DiscordBot};
pub use handler::DiscordMessageHandler;
pub use transport::SerenityTransport;
