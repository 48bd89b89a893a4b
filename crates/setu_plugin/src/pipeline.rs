use crate::replies::{plugin_failure, ReplyTable};
use crate::trigger;
use anyhow::Result;
use setu_api::{SetuClient, SetuQuery};
use setu_core::config::{PluginConfig, RequestConfig};
use setu_core::{MessageEvent, Reply, RequestMode, SetuConfig, SetuError, TriggerProfile};
use setu_store::ImageStore;
use std::sync::Arc;
use std::time::Duration;

/// The plugin: one instance per host, shared by every message task.
pub struct SetuPlugin {
    client: SetuClient,
    store: Arc<ImageStore>,
    profile: TriggerProfile,
    request: RequestConfig,
    delete_delay: Duration,
}

impl SetuPlugin {
    pub fn new(
        client: SetuClient,
        store: Arc<ImageStore>,
        plugin: &PluginConfig,
        request: RequestConfig,
    ) -> Self {
        Self {
            client,
            store,
            profile: plugin.profile,
            request,
            delete_delay: Duration::from_millis(plugin.delete_delay_ms),
        }
    }

    pub fn from_config(cfg: &SetuConfig) -> Result<Self> {
        let client = SetuClient::from_config(&cfg.api)?;
        let store = Arc::new(ImageStore::from_config(&cfg.store)?);
        Ok(Self::new(client, store, &cfg.plugin, cfg.request.clone()))
    }

    pub fn store(&self) -> &Arc<ImageStore> {
        &self.store
    }

    /// Entry point for every inbound message.
    ///
    /// Untriggered messages return [`Reply::Empty`] without touching the
    /// network. Otherwise the acknowledgement goes out immediately and the
    /// returned reply is the final status line.
    pub async fn on_message(&self, event: &dyn MessageEvent) -> Reply {
        let text = event.lowered();
        let Some(mode) = trigger::detect(self.profile, &text) else {
            return Reply::empty();
        };

        let replies = ReplyTable::for_mode(self.profile, mode);
        if let Err(e) = event.send(Reply::plain(replies.ack)).await {
            tracing::error!("Message handler error: {}", e);
            return Reply::plain(plugin_failure(&e));
        }

        self.handle_image_request(event, mode).await
    }

    /// Fetch, save, send, clean up. Always answers with a line from the
    /// mode's reply table.
    pub async fn handle_image_request(&self, event: &dyn MessageEvent, mode: RequestMode) -> Reply {
        let replies = ReplyTable::for_mode(self.profile, mode);
        match self.run(event, mode, replies).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Request handling failed: {}", e);
                Reply::plain(replies.generic)
            }
        }
    }

    async fn run(
        &self,
        event: &dyn MessageEvent,
        mode: RequestMode,
        replies: &ReplyTable,
    ) -> Result<Reply, SetuError> {
        let query = SetuQuery::from_config(mode, &self.request);
        let items = match self.client.fetch(&query).await {
            Some(items) if !items.is_empty() => items,
            _ => return Ok(Reply::plain(replies.no_data)),
        };

        let item = &items[0];
        let Some(url) = item.original_url() else {
            return Ok(Reply::plain(replies.no_url));
        };
        let name = item.file_name()?;

        // Another request for the same work must not delete this file
        // between our save and send.
        let _lease = self.store.lease(&name).await;
        if !self.store.save(url, &name).await {
            return Ok(Reply::plain(replies.save_failed));
        }

        let path = self.store.path_of(&name);
        match event.send(Reply::image(&path)).await {
            Ok(()) => {
                tracing::info!("Image sent: {} (R18: {})", name, mode.is_adult());
                // Give the host a moment to read the file before it goes away.
                tokio::time::sleep(self.delete_delay).await;
                if self.store.delete(&name).await {
                    Ok(Reply::plain(replies.success))
                } else {
                    Ok(Reply::plain(replies.cleanup_failed))
                }
            }
            Err(e) => {
                tracing::warn!("Send failed for {}: {}", name, e);
                self.store.delete(&name).await;
                Ok(Reply::plain(replies.send_failed))
            }
        }
    }

    /// Shutdown hook: empty the image directory.
    pub async fn terminate(&self) -> usize {
        let removed = self.store.purge().await;
        tracing::info!("Plugin terminated, cleaned up {} images", removed);
        removed
    }
}
