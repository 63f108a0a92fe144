//! Bridge between the game events and Discord.
//!
//! ## Module Structure
//!
//! - `channels`: Communication channel structures
//! - `orchestrator`: Bridge facade (`Bridge` struct)
//! - `resolver`: Channel tag to Discord channel mapping
//! - `webhook`: Per-channel webhook cache

pub mod channels;
pub mod orchestrator;
pub mod resolver;
pub mod webhook;

pub use channels::ChannelBundle;
pub use orchestrator::Bridge;
