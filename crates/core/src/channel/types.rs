//! Types for messaging channel operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur talking to the messaging channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The transport timed out. Advisory during the final upload: the
    /// send may still be completing server-side.
    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(String),

    /// The channel API rejected the call.
    #[error("API error: {description}")]
    Api { description: String },
}

impl ChannelError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChannelError::Timeout
        } else {
            ChannelError::Request(e.to_string())
        }
    }
}

/// Chat identifier on the channel.
pub type ChatId = i64;

/// Reference to a message previously sent to a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

// ============================================================================
// Telegram wire types (the subset the gateway consumes)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}
