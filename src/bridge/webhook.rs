//! Per-channel webhook cache.

use std::collections::HashMap;

use serenity::model::id::ChannelId;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::common::error::DiscordResult;
use crate::discord::transport::DiscordTransport;

/// Webhooks obtained so far, one per channel, kept for the process lifetime.
pub struct WebhookCache<W> {
    hooks: RwLock<HashMap<ChannelId, W>>,
}

impl<W: Clone + Send + Sync> Default for WebhookCache<W> {
    fn default() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }
}

impl<W: Clone + Send + Sync> WebhookCache<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached webhook for a channel, or the first existing one, or a new one.
    ///
    /// The lock is released before any network call. Two concurrent misses
    /// for the same channel may both fetch; the first insert wins.
    pub async fn get_or_create<T>(
        &self,
        transport: &T,
        channel_id: ChannelId,
        name: &str,
    ) -> DiscordResult<W>
    where
        T: DiscordTransport<Webhook = W> + ?Sized,
    {
        if let Some(hook) = self.hooks.read().await.get(&channel_id) {
            return Ok(hook.clone());
        }

        let hook = match transport.fetch_webhook(channel_id).await? {
            Some(hook) => {
                debug!(channel_id = channel_id.get(), "Using existing webhook");
                hook
            }
            None => {
                info!(channel_id = channel_id.get(), "Creating webhook '{}'", name);
                transport.create_webhook(channel_id, name).await?
            }
        };

        let mut hooks = self.hooks.write().await;
        Ok(hooks.entry(channel_id).or_insert(hook).clone())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.hooks.read().await.len()
    }
}
