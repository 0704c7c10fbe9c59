//! Outbound messaging seam.
//!
//! The chat pipeline talks to Telegram only through [`Transport`], which the
//! throttled teloxide bot implements in [`telegram`]. Everything here is
//! fire-and-forget except for the flood-control signal, which callers may act on.

mod split;
pub mod telegram;

pub use split::{send_long, split_chunks};

use std::time::Duration;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};
use thiserror::Error;
use url::Url;

/// Telegram's limit for photo captions, in UTF-16 code units.
pub const MAX_CAPTION_LENGTH: usize = 1024;

/// Errors surfaced by the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Telegram asked us to slow down.
    #[error("flood control: retry after {0:?}")]
    RetryAfter(Duration),

    /// Any other failed request.
    #[error("request failed: {0}")]
    Request(String),
}

/// A bot reply to one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    /// Text body, or the caption when an image is attached.
    pub text: String,
    pub image_url: Option<Url>,
    pub reply_to: Option<MessageId>,
    /// Attach the regenerate/like/dislike keyboard.
    pub feedback: bool,
}

impl OutboundReply {
    /// Plain text reply without feedback controls.
    pub fn text(text: impl Into<String>, reply_to: MessageId) -> Self {
        Self {
            text: text.into(),
            image_url: None,
            reply_to: Some(reply_to),
            feedback: false,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a bare text message.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), TransportError>;

    /// Send a reply as text, or as a photo with caption when it carries an image.
    async fn send_reply(
        &self,
        chat_id: ChatId,
        reply: &OutboundReply,
    ) -> Result<(), TransportError>;

    async fn send_reaction(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError>;

    async fn send_sticker(
        &self,
        chat_id: ChatId,
        file_id: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), TransportError>;

    /// Show the "typing..." indicator.
    async fn send_typing(&self, chat_id: ChatId) -> Result<(), TransportError>;

    /// Remove the inline keyboard from a message.
    async fn clear_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;

    /// Acknowledge a callback query, optionally with a toast text.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;
}
