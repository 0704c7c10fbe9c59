//! [`Transport`] on top of the throttled teloxide bot.

use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ReactionType,
    ReplyParameters,
};

use super::{OutboundReply, Transport, TransportError};
use crate::bot::dispatcher::ThrottledBot;
use crate::chat::FeedbackAction;

impl From<RequestError> for TransportError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::RetryAfter(wait) => Self::RetryAfter(wait.duration()),
            other => Self::Request(other.to_string()),
        }
    }
}

/// The regenerate/like/dislike keyboard attached to replies.
pub fn feedback_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        FeedbackAction::ALL
            .iter()
            .map(|action| InlineKeyboardButton::callback(action.label(), action.token()))
            .collect::<Vec<_>>(),
    ])
}

#[async_trait]
impl Transport for ThrottledBot {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), TransportError> {
        let mut request = self.send_message(chat_id, text);
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(id));
        }
        request.await?;
        Ok(())
    }

    async fn send_reply(
        &self,
        chat_id: ChatId,
        reply: &OutboundReply,
    ) -> Result<(), TransportError> {
        match &reply.image_url {
            Some(url) => {
                let mut request = self
                    .send_photo(chat_id, InputFile::url(url.clone()))
                    .caption(reply.text.clone());
                if let Some(id) = reply.reply_to {
                    request = request.reply_parameters(ReplyParameters::new(id));
                }
                if reply.feedback {
                    request = request.reply_markup(feedback_keyboard());
                }
                request.await?;
            }
            None => {
                let mut request = self.send_message(chat_id, reply.text.clone());
                if let Some(id) = reply.reply_to {
                    request = request.reply_parameters(ReplyParameters::new(id));
                }
                if reply.feedback {
                    request = request.reply_markup(feedback_keyboard());
                }
                request.await?;
            }
        }
        Ok(())
    }

    async fn send_reaction(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        self.set_message_reaction(chat_id, message_id)
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await?;
        Ok(())
    }

    async fn send_sticker(
        &self,
        chat_id: ChatId,
        file_id: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), TransportError> {
        let mut request = Requester::send_sticker(self, chat_id, InputFile::file_id(file_id));
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(id));
        }
        request.await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), TransportError> {
        self.send_chat_action(chat_id, ChatAction::Typing).await?;
        Ok(())
    }

    async fn clear_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.edit_message_reply_markup(chat_id, message_id).await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut request = self.answer_callback_query(callback_id);
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }
}
