//! Messaging channel abstraction.
//!
//! This module provides a `ChannelTransport` trait for delivering text and
//! media to a chat, plus the Telegram Bot API implementation.

mod telegram;
mod traits;
mod types;

pub use telegram::TelegramChannel;
pub use traits::ChannelTransport;
pub use types::*;
