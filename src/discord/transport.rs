//! Discord REST delivery.
//!
//! The bridge talks to Discord only through [`DiscordTransport`], so it
//! can be driven by an in-memory transport in tests.

use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::{
    CreateAttachment, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage,
    CreateWebhook, ExecuteWebhook,
};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use serenity::model::webhook::Webhook;
use serenity::model::Timestamp;

use crate::common::error::{DiscordError, DiscordResult};
use crate::render::{EmbedPayload, ImageAttachment, WebhookPayload};

/// Outbound Discord operations used by the bridge and the commands.
#[async_trait]
pub trait DiscordTransport: Send + Sync {
    /// Handle for an executable channel webhook.
    type Webhook: Clone + Send + Sync;

    async fn send_embed(&self, channel_id: ChannelId, embed: &EmbedPayload) -> DiscordResult<()>;

    async fn send_text(&self, channel_id: ChannelId, content: &str) -> DiscordResult<()>;

    async fn send_file(&self, channel_id: ChannelId, file: &ImageAttachment) -> DiscordResult<()>;

    /// First usable webhook already present on a channel.
    async fn fetch_webhook(&self, channel_id: ChannelId) -> DiscordResult<Option<Self::Webhook>>;

    async fn create_webhook(
        &self,
        channel_id: ChannelId,
        name: &str,
    ) -> DiscordResult<Self::Webhook>;

    async fn execute_webhook(
        &self,
        webhook: &Self::Webhook,
        payload: &WebhookPayload,
    ) -> DiscordResult<()>;
}

/// Build a serenity embed from a payload.
pub fn build_embed(payload: &EmbedPayload) -> CreateEmbed {
    let mut embed = CreateEmbed::new();

    if let Some(color) = payload.color {
        embed = embed.color(color);
    }
    if let Some(description) = &payload.description {
        embed = embed.description(description);
    }
    if let Some(author) = &payload.author {
        let mut block = CreateEmbedAuthor::new(&author.name);
        if let Some(icon_url) = &author.icon_url {
            block = block.icon_url(icon_url);
        }
        embed = embed.author(block);
    }
    // Discord rejects empty footer text
    if let Some(footer) = payload.footer.as_ref().filter(|footer| !footer.is_empty()) {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(timestamp) = payload
        .timestamp
        .and_then(|ts| Timestamp::from_unix_timestamp(ts.timestamp()).ok())
    {
        embed = embed.timestamp(timestamp);
    }

    embed
}

/// Transport backed by serenity's HTTP client.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn send_failed(channel_id: ChannelId, error: serenity::Error) -> DiscordError {
        DiscordError::SendFailed {
            channel_id: channel_id.get(),
            message: error.to_string(),
        }
    }

    fn webhook_failed(channel_id: ChannelId, error: serenity::Error) -> DiscordError {
        DiscordError::Webhook {
            channel_id: channel_id.get(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl DiscordTransport for SerenityTransport {
    type Webhook = Webhook;

    async fn send_embed(&self, channel_id: ChannelId, embed: &EmbedPayload) -> DiscordResult<()> {
        channel_id
            .send_message(&*self.http, CreateMessage::new().embed(build_embed(embed)))
            .await
            .map_err(|e| Self::send_failed(channel_id, e))?;
        Ok(())
    }

    async fn send_text(&self, channel_id: ChannelId, content: &str) -> DiscordResult<()> {
        channel_id
            .say(&*self.http, content)
            .await
            .map_err(|e| Self::send_failed(channel_id, e))?;
        Ok(())
    }

    async fn send_file(&self, channel_id: ChannelId, file: &ImageAttachment) -> DiscordResult<()> {
        let attachment = CreateAttachment::bytes(file.data.clone(), file.file_name.clone());
        channel_id
            .send_message(&*self.http, CreateMessage::new().add_file(attachment))
            .await
            .map_err(|e| Self::send_failed(channel_id, e))?;
        Ok(())
    }

    async fn fetch_webhook(&self, channel_id: ChannelId) -> DiscordResult<Option<Webhook>> {
        let webhooks = channel_id
            .webhooks(&*self.http)
            .await
            .map_err(|e| Self::webhook_failed(channel_id, e))?;
        // Only webhooks carrying a token can be executed by us
        Ok(webhooks.into_iter().find(|webhook| webhook.token.is_some()))
    }

    async fn create_webhook(&self, channel_id: ChannelId, name: &str) -> DiscordResult<Webhook> {
        channel_id
            .create_webhook(&*self.http, CreateWebhook::new(name))
            .await
            .map_err(|e| Self::webhook_failed(channel_id, e))
    }

    async fn execute_webhook(
        &self,
        webhook: &Webhook,
        payload: &WebhookPayload,
    ) -> DiscordResult<()> {
        let mut builder = ExecuteWebhook::new()
            .username(&payload.username)
            .avatar_url(&payload.avatar_url);
        if let Some(content) = &payload.content {
            builder = builder.content(content);
        }
        if !payload.embeds.is_empty() {
            builder = builder.embeds(payload.embeds.iter().map(build_embed).collect());
        }

        webhook
            .execute(&*self.http, false, builder)
            .await
            .map_err(|e| DiscordError::SendFailed {
                channel_id: webhook.channel_id.map_or(0, |id| id.get()),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
