//! Telegram Bot API transport implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

use super::traits::ChannelTransport;
use super::types::{ChannelError, ChatId, MessageRef, Update};

/// Telegram bot upload limit (50 MiB).
const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Telegram media caption ceiling.
const MAX_CAPTION_CHARS: usize = 1024;

/// Connect/read/write timeout for API calls, uploads included.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Telegram Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
    chat: super::types::Chat,
}

/// Telegram Bot API transport.
pub struct TelegramChannel {
    http: reqwest::Client,
    api_base: String,
}

impl TelegramChannel {
    /// Creates a transport for the given bot token.
    pub fn new(token: &str) -> Result<Self, ChannelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChannelError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: format!("https://api.telegram.org/bot{}", token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Value,
    ) -> Result<T, ChannelError> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_base, method))
            .json(params)
            .send()
            .await
            .map_err(ChannelError::from_reqwest)?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(ChannelError::from_reqwest)?;

        if !envelope.ok {
            return Err(ChannelError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        envelope.result.ok_or(ChannelError::Api {
            description: "missing result".to_string(),
        })
    }

    /// Uploads a local file via multipart along with caption fields.
    async fn send_file(
        &self,
        method: &str,
        field: &str,
        chat: ChatId,
        path: &Path,
        caption: &str,
        extra: &[(&str, &str)],
    ) -> Result<(), ChannelError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChannelError::Request(format!("Failed to read upload: {}", e)))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", caption.to_string())
            .part(
                field.to_string(),
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        for (key, value) in extra {
            form = form.text(key.to_string(), value.to_string());
        }

        let response = self
            .http
            .post(format!("{}/{}", self.api_base, method))
            .multipart(form)
            .send()
            .await
            .map_err(ChannelError::from_reqwest)?;

        let envelope: ApiResponse<Value> = response
            .json()
            .await
            .map_err(ChannelError::from_reqwest)?;

        if !envelope.ok {
            return Err(ChannelError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(())
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout_secs: u64,
    ) -> Result<Vec<Update>, ChannelError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": poll_timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    /// Acknowledges an interactive callback so the client stops spinning.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }

    /// Sends a text message with an inline keyboard of (label, data) buttons.
    pub async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[(&str, &str)],
    ) -> Result<MessageRef, ChannelError> {
        let keyboard: Vec<Vec<Value>> = vec![buttons
            .iter()
            .map(|(label, data)| json!({ "text": label, "callback_data": data }))
            .collect()];

        let sent: SentMessage = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": chat,
                    "text": text,
                    "reply_markup": { "inline_keyboard": keyboard },
                }),
            )
            .await?;

        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }
}

#[async_trait]
impl ChannelTransport for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn max_upload_bytes(&self) -> u64 {
        MAX_UPLOAD_BYTES
    }

    fn max_caption_chars(&self) -> usize {
        MAX_CAPTION_CHARS
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChannelError> {
        let sent: SentMessage = self
            .call("sendMessage", &json!({ "chat_id": chat, "text": text }))
            .await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit_text(&self, msg: &MessageRef, text: &str) -> Result<(), ChannelError> {
        // Telegram returns the edited message or `true`; we need neither.
        let _: Value = self
            .call(
                "editMessageText",
                &json!({
                    "chat_id": msg.chat_id,
                    "message_id": msg.message_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: &MessageRef) -> Result<(), ChannelError> {
        let _: bool = self
            .call(
                "deleteMessage",
                &json!({ "chat_id": msg.chat_id, "message_id": msg.message_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<(), ChannelError> {
        self.send_file(
            "sendVideo",
            "video",
            chat,
            path,
            caption,
            &[("supports_streaming", "true")],
        )
        .await
    }

    async fn send_audio(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
    ) -> Result<(), ChannelError> {
        self.send_file("sendAudio", "audio", chat, path, caption, &[])
            .await
    }
}
