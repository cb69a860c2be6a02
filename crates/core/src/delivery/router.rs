//! Size-based delivery routing.
//!
//! Finished artifacts that fit under the channel's upload limit are sent
//! inline; anything larger is parked in the expiring file store and the
//! chat gets a retrieval link instead.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::caption::build_caption;
use crate::channel::{ChannelError, ChannelTransport, ChatId};
use crate::fetcher::QualityTier;
use crate::filestore::{ExpiringFileStore, FileStoreError};
use crate::orchestrator::Artifact;

/// Errors from delivering a finished artifact.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Store error: {0}")]
    Store(#[from] FileStoreError),
}

/// How an artifact reached the user.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResult {
    /// Pushed through the chat channel directly.
    Inline,
    /// Parked in the file store, link handed out.
    Offloaded {
        url: String,
        size_bytes: u64,
        retention_hours: u64,
    },
}

pub struct DeliveryRouter {
    transport: Arc<dyn ChannelTransport>,
    store: Arc<ExpiringFileStore>,
    public_base_url: String,
    retention_hours: u64,
}

impl DeliveryRouter {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        store: Arc<ExpiringFileStore>,
        public_base_url: String,
        retention_hours: u64,
    ) -> Self {
        Self {
            transport,
            store,
            public_base_url,
            retention_hours,
        }
    }

    /// Delivers an artifact to a chat, routing by size. The transient
    /// download file is cleaned up whether delivery succeeds or fails;
    /// it never outlives the request.
    pub async fn deliver(
        &self,
        chat: ChatId,
        artifact: &Artifact,
        tier: QualityTier,
    ) -> Result<DeliveryResult, DeliveryError> {
        let result = if artifact.size_bytes <= self.transport.max_upload_bytes() {
            self.deliver_inline(chat, artifact, tier)
                .await
                .map(|()| DeliveryResult::Inline)
        } else {
            self.deliver_offloaded(artifact).await
        };

        remove_transient(&artifact.path).await;
        result
    }

    async fn deliver_inline(
        &self,
        chat: ChatId,
        artifact: &Artifact,
        tier: QualityTier,
    ) -> Result<(), DeliveryError> {
        let caption = build_caption(&artifact.metadata, self.transport.max_caption_chars());

        let sent = match tier {
            QualityTier::Audio => {
                self.transport
                    .send_audio(chat, &artifact.path, &caption)
                    .await
            }
            QualityTier::Hd | QualityTier::Sd => {
                self.transport
                    .send_video(chat, &artifact.path, &caption)
                    .await
            }
        };

        match sent {
            Ok(()) => {
                info!(
                    "Delivered '{}' inline ({} bytes)",
                    artifact.title, artifact.size_bytes
                );
                Ok(())
            }
            // The request timed out client-side but the upload usually
            // completes anyway once the payload is in flight.
            Err(ChannelError::Timeout) => {
                warn!(
                    "Upload of '{}' timed out client-side, assuming delivered",
                    artifact.title
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn deliver_offloaded(&self, artifact: &Artifact) -> Result<DeliveryResult, DeliveryError> {
        let original_name = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.mp4", artifact.title));

        let handle = self.store.register(&artifact.path, &original_name).await?;
        let url = format!("{}/download/{}", self.public_base_url, handle);

        info!(
            "Offloaded '{}' ({} bytes) to {}",
            artifact.title, artifact.size_bytes, url
        );

        Ok(DeliveryResult::Offloaded {
            url,
            size_bytes: artifact.size_bytes,
            retention_hours: self.retention_hours,
        })
    }
}

async fn remove_transient(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove transient file {:?}: {}", path, e);
    }
    // The per-request work dir is empty now; remove_dir refuses otherwise
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::remove_dir(parent).await;
    }
}
