//! Chat-facing gateway.
//!
//! Long-polls the channel for updates, walks each chat through the
//! link -> quality keyboard -> download flow, and hands finished
//! artifacts to the delivery router.

use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use clipferry_core::channel::{
    CallbackQuery, ChannelTransport, ChatId, IncomingMessage, MessageRef, TelegramChannel, Update,
};
use clipferry_core::progress::{StatusMessage, StatusUpdater};
use clipferry_core::{
    DeliveryResult, DeliveryRouter, DownloadOrchestrator, DownloadRequest, QualityTier,
};

use super::text;

/// Long-poll window for getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Back-off after a failed poll.
const POLL_RETRY_SECS: u64 = 3;

const QUALITY_BUTTONS: &[(&str, &str)] = &[
    ("🎥 HD", "tier:hd"),
    ("📱 SD", "tier:sd"),
    ("🎵 Audio", "tier:audio"),
    ("❌ Cancel", "cancel"),
];

pub struct BotGateway {
    channel: Arc<TelegramChannel>,
    orchestrator: Arc<DownloadOrchestrator>,
    router: Arc<DeliveryRouter>,
    /// Link awaiting a quality pick, one per chat. A new link replaces
    /// the previous one.
    pending: Mutex<HashMap<ChatId, String>>,
    url_pattern: Regex,
}

impl BotGateway {
    pub fn new(
        channel: Arc<TelegramChannel>,
        orchestrator: Arc<DownloadOrchestrator>,
        router: Arc<DeliveryRouter>,
    ) -> Self {
        let url_pattern = Regex::new(
            r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/)[\w-]+[^\s]*",
        )
        .unwrap_or_else(|e| unreachable!("URL pattern is a constant: {}", e));

        Self {
            channel,
            orchestrator,
            router,
            pending: Mutex::new(HashMap::new()),
            url_pattern,
        }
    }

    /// Runs the long-poll loop until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Bot gateway started");
        let mut offset = 0i64;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Bot gateway received shutdown signal");
                    break;
                }
                result = self.channel.get_updates(offset, POLL_TIMEOUT_SECS) => {
                    match result {
                        Ok(updates) => {
                            for update in updates {
                                offset = offset.max(update.update_id + 1);
                                Arc::clone(&self).handle_update(update).await;
                            }
                        }
                        Err(e) => {
                            warn!("Polling for updates failed: {}", e);
                            tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
                        }
                    }
                }
            }
        }
    }

    async fn handle_update(self: Arc<Self>, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: IncomingMessage) {
        let chat = message.chat.id;
        let Some(message_text) = message.text else {
            return;
        };
        let message_text = message_text.trim();

        let outcome = match message_text {
            "/start" => self.channel.send_text(chat, text::START_TEXT).await,
            "/help" => self.channel.send_text(chat, text::HELP_TEXT).await,
            other => {
                let Some(url) = self.extract_url(other) else {
                    // Not a supported link, stay quiet
                    debug!("Ignoring unrecognized message in chat {}", chat);
                    return;
                };
                self.pending.lock().unwrap().insert(chat, url);
                self.channel
                    .send_keyboard(chat, text::CHOOSE_QUALITY_TEXT, QUALITY_BUTTONS)
                    .await
            }
        };

        if let Err(e) = outcome {
            warn!("Failed to respond in chat {}: {}", chat, e);
        }
    }

    async fn handle_callback(self: Arc<Self>, callback: CallbackQuery) {
        if let Err(e) = self.channel.answer_callback(&callback.id).await {
            debug!("Failed to acknowledge callback: {}", e);
        }

        let (Some(data), Some(message)) = (callback.data, callback.message) else {
            return;
        };
        let chat = message.chat.id;
        let keyboard_msg = MessageRef {
            chat_id: chat,
            message_id: message.message_id,
        };

        if data == "cancel" {
            self.pending.lock().unwrap().remove(&chat);
            if let Err(e) = self.channel.delete_message(&keyboard_msg).await {
                debug!("Failed to remove quality keyboard: {}", e);
            }
            return;
        }

        let Some(tier) = data.strip_prefix("tier:").and_then(QualityTier::parse) else {
            debug!("Ignoring unknown callback payload '{}'", data);
            return;
        };

        let url = self.pending.lock().unwrap().remove(&chat);
        let Some(url) = url else {
            let _ = self
                .channel
                .edit_text(&keyboard_msg, text::SESSION_EXPIRED_TEXT)
                .await;
            return;
        };

        // Repurpose the keyboard message as the status message
        if let Err(e) = self.channel.edit_text(&keyboard_msg, text::PROBING_TEXT).await {
            warn!("Failed to update status message in chat {}: {}", chat, e);
        }

        let gateway = Arc::clone(&self);
        tokio::spawn(async move {
            gateway.process_download(chat, keyboard_msg, url, tier).await;
        });
    }

    async fn process_download(
        &self,
        chat: ChatId,
        status_msg: MessageRef,
        url: String,
        tier: QualityTier,
    ) {
        let transport: Arc<dyn ChannelTransport> = Arc::clone(&self.channel) as _;
        let status = Arc::new(StatusMessage::new(Arc::clone(&transport), status_msg));
        let request = DownloadRequest::new(url, tier);

        let artifact = match self
            .orchestrator
            .run(&request, Arc::clone(&status) as Arc<dyn StatusUpdater>)
            .await
        {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("Download for chat {} failed: {}", chat, e);
                let _ = status.update(e.user_message()).await;
                return;
            }
        };

        if let Err(e) = status.update("📤 Sending…").await {
            debug!("Failed to update status message: {}", e);
        }

        match self.router.deliver(chat, &artifact, tier).await {
            Ok(DeliveryResult::Inline) => {
                // The media message replaces the status line
                if let Err(e) = transport.delete_message(&status_msg).await {
                    debug!("Failed to remove status message: {}", e);
                }
            }
            Ok(DeliveryResult::Offloaded {
                url,
                size_bytes,
                retention_hours,
            }) => {
                let text = format!(
                    "✅ {}\n\nThe file is too large to send here ({}).\n\
                     📥 Download it within {}h (link works once):\n{}",
                    artifact.title,
                    format_size(size_bytes),
                    retention_hours,
                    url
                );
                if let Err(e) = status.update(&text).await {
                    warn!("Failed to deliver download link to chat {}: {}", chat, e);
                }
            }
            Err(e) => {
                error!("Delivery to chat {} failed: {}", chat, e);
                let _ = status
                    .update("❌ The download finished but sending it failed. Please try again.")
                    .await;
            }
        }
    }

    /// Extracts the first supported video URL from a message, adding the
    /// scheme when the user left it off.
    fn extract_url(&self, message_text: &str) -> Option<String> {
        let matched = self.url_pattern.find(message_text)?.as_str();
        if matched.starts_with("http://") || matched.starts_with("https://") {
            Some(matched.to_string())
        } else {
            Some(format!("https://{}", matched))
        }
    }
}

fn format_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.1} MB", mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipferry_core::config::DownloaderConfig;
    use clipferry_core::fetcher::YtDlpFetcher;
    use clipferry_core::filestore::ExpiringFileStore;

    fn gateway() -> BotGateway {
        let channel = Arc::new(TelegramChannel::new("123:test").unwrap());
        let fetcher = Arc::new(YtDlpFetcher::new(DownloaderConfig::default()));
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            DownloaderConfig::default(),
            fetcher,
        ));
        let store = Arc::new(ExpiringFileStore::new(Default::default()));
        let router = Arc::new(DeliveryRouter::new(
            Arc::clone(&channel) as Arc<dyn ChannelTransport>,
            store,
            "http://localhost:8080".to_string(),
            24,
        ));
        BotGateway::new(channel, orchestrator, router)
    }

    #[test]
    fn test_extract_url_variants() {
        let g = gateway();
        assert_eq!(
            g.extract_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            g.extract_url("check this out: youtu.be/dQw4w9WgXcQ !!"),
            Some("https://youtu.be/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            g.extract_url("https://youtube.com/shorts/abc-DEF_123"),
            Some("https://youtube.com/shorts/abc-DEF_123".to_string())
        );
    }

    #[test]
    fn test_extract_url_rejects_noise() {
        let g = gateway();
        assert_eq!(g.extract_url("hello there"), None);
        assert_eq!(g.extract_url("https://vimeo.com/12345"), None);
        assert_eq!(g.extract_url("/start"), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(52 * 1024 * 1024), "52.0 MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00 GB");
    }
}
