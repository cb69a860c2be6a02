//! Trait definitions for the channel module.

use async_trait::async_trait;
use std::path::Path;

use super::types::{ChannelError, ChatId, MessageRef};

/// A messaging channel that can carry text and media files.
///
/// The transport protocol itself is the implementation's concern; the
/// pipeline only needs "send bytes" operations and the channel's limits.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Largest file the channel accepts for inline delivery.
    fn max_upload_bytes(&self) -> u64;

    /// Caption length ceiling for media messages.
    fn max_caption_chars(&self) -> usize;

    /// Send a plain text message, returning a reference for later edits.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChannelError>;

    /// Edit a previously sent text message.
    async fn edit_text(&self, msg: &MessageRef, text: &str) -> Result<(), ChannelError>;

    /// Delete a previously sent message.
    async fn delete_message(&self, msg: &MessageRef) -> Result<(), ChannelError>;

    /// Send a local video file inline as a streamable video.
    async fn send_video(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<(), ChannelError>;

    /// Send a local audio file inline.
    async fn send_audio(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<(), ChannelError>;
}
