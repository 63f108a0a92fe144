//! Outbound message rendering.
//!
//! Turns bridge events into transport payloads according to the
//! configured message mode:
//! - `bot`: an embed posted by the bot account
//! - `webhook`: a message impersonating the player through a channel webhook
//! - `minecraft`: a rendered image of the in-game chat line

pub mod font;
pub mod image;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::common::error::{BridgeError, BridgeResult};
use crate::common::{ChatEvent, PresenceEvent};
use crate::minecraft::format::strip_formatting;

pub use self::image::{BitmapChatRenderer, ChatImageRenderer};

/// Colour of chat broadcast embeds.
pub const CHAT_EMBED_COLOR: u32 = 3447003;

/// How outbound chat is presented on Discord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageMode {
    Bot,
    Webhook,
    Minecraft,
}

impl MessageMode {
    /// Parse the configured mode (case-insensitive).
    pub fn parse(mode: &str) -> BridgeResult<Self> {
        match mode.to_lowercase().as_str() {
            "bot" => Ok(MessageMode::Bot),
            "webhook" => Ok(MessageMode::Webhook),
            "minecraft" => Ok(MessageMode::Minecraft),
            _ => Err(BridgeError::InvalidMessageMode {
                mode: mode.to_string(),
            }),
        }
    }
}

/// Embed author block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Transport-neutral embed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedPayload {
    pub color: Option<u32>,
    pub description: Option<String>,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A message sent through a channel webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookPayload {
    pub content: Option<String>,
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<EmbedPayload>,
}

/// A file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Rendered output, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Embed(EmbedPayload),
    Webhook(WebhookPayload),
    Image {
        attachment: ImageAttachment,
        /// Plain messages sent after the image (link previews).
        follow_ups: Vec<String>,
    },
}

/// What is being rendered.
#[derive(Debug, Clone)]
pub enum RenderRequest<'a> {
    Chat(&'a ChatEvent),
    CleanEmbed {
        message: &'a str,
        color: u32,
    },
    HeadedEmbed {
        message: &'a str,
        title: &'a str,
        icon: Option<&'a str>,
        color: u32,
    },
    Toggle(&'a PresenceEvent),
}

/// Message renderer.
#[derive(Clone)]
pub struct MessageRenderer {
    /// Avatar URL template with a `{username}` placeholder.
    avatar_template: String,
    images: Arc<dyn ChatImageRenderer>,
}

impl MessageRenderer {
    pub fn new(avatar_template: impl Into<String>, images: Arc<dyn ChatImageRenderer>) -> Self {
        Self {
            avatar_template: avatar_template.into(),
            images,
        }
    }

    /// Avatar URL for a player.
    pub fn avatar_url(&self, username: &str) -> String {
        self.avatar_template.replace("{username}", username)
    }

    /// Render a request in the given mode.
    ///
    /// Clean and headed embeds look the same in every mode.
    pub fn render(&self, request: &RenderRequest<'_>, mode: MessageMode) -> BridgeResult<Payload> {
        match request {
            RenderRequest::Chat(event) => self.render_chat(event, mode),
            RenderRequest::CleanEmbed { message, color } => Ok(Payload::Embed(EmbedPayload {
                color: Some(*color),
                description: Some(message.to_string()),
                ..EmbedPayload::default()
            })),
            RenderRequest::HeadedEmbed {
                message,
                title,
                icon,
                color,
            } => Ok(Payload::Embed(EmbedPayload {
                color: Some(*color),
                description: Some(message.to_string()),
                author: Some(EmbedAuthor {
                    name: title.to_string(),
                    icon_url: icon.map(str::to_string),
                }),
                ..EmbedPayload::default()
            })),
            RenderRequest::Toggle(event) => self.render_toggle(event, mode),
        }
    }

    fn render_chat(&self, event: &ChatEvent, mode: MessageMode) -> BridgeResult<Payload> {
        match mode {
            MessageMode::Bot => Ok(Payload::Embed(EmbedPayload {
                color: Some(CHAT_EMBED_COLOR),
                description: Some(event.message.clone()),
                author: Some(EmbedAuthor {
                    name: event.username.clone(),
                    icon_url: Some(self.avatar_url(&event.username)),
                }),
                footer: Some(event.guild_rank.clone()),
                timestamp: Some(Utc::now()),
            })),
            MessageMode::Webhook => Ok(Payload::Webhook(WebhookPayload {
                content: Some(strip_mentions(&event.message)),
                username: event.username.clone(),
                avatar_url: self.avatar_url(&event.username),
                embeds: Vec::new(),
            })),
            MessageMode::Minecraft => Ok(Payload::Image {
                attachment: self.render_image(&event.full_message, &event.username)?,
                follow_ups: link_follow_ups(&event.full_message),
            }),
        }
    }

    fn render_toggle(&self, event: &PresenceEvent, mode: MessageMode) -> BridgeResult<Payload> {
        let line = format!("{} {}", event.username, event.message);
        match mode {
            MessageMode::Bot => Ok(Payload::Embed(EmbedPayload {
                color: Some(event.color),
                author: Some(EmbedAuthor {
                    name: line,
                    icon_url: Some(self.avatar_url(&event.username)),
                }),
                timestamp: Some(Utc::now()),
                ..EmbedPayload::default()
            })),
            MessageMode::Webhook => Ok(Payload::Webhook(WebhookPayload {
                content: None,
                username: event.username.clone(),
                avatar_url: self.avatar_url(&event.username),
                embeds: vec![EmbedPayload {
                    color: Some(event.color),
                    description: Some(line),
                    ..EmbedPayload::default()
                }],
            })),
            MessageMode::Minecraft => Ok(Payload::Image {
                attachment: self.render_image(&event.full_message, &event.username)?,
                follow_ups: Vec::new(),
            }),
        }
    }

    fn render_image(&self, full_message: &str, username: &str) -> BridgeResult<ImageAttachment> {
        Ok(ImageAttachment {
            file_name: format!("{}.png", username),
            data: self.images.render(full_message)?,
        })
    }
}

/// Remove every `@` so relayed text can never ping.
pub fn strip_mentions(message: &str) -> String {
    message.replace('@', "")
}

/// Tokens of a line that are links, for re-posting as text.
pub fn link_follow_ups(full_message: &str) -> Vec<String> {
    if !full_message.contains("http://") && !full_message.contains("https://") {
        return Vec::new();
    }

    strip_formatting(full_message)
        .split_whitespace()
        .filter(|token| token.starts_with("https://") || token.starts_with("http://"))
        .map(str::to_string)
        .collect()
}
