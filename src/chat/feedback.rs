//! Feedback controls attached to bot replies.

use teloxide::types::{ChatId, MessageId};

use super::message::IncomingMessage;

/// One of the inline buttons under a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackAction {
    Regenerate,
    Like,
    Dislike,
}

impl FeedbackAction {
    /// Button order in the keyboard.
    pub const ALL: [Self; 3] = [Self::Regenerate, Self::Like, Self::Dislike];

    /// Callback data carried by the button.
    pub fn token(self) -> &'static str {
        match self {
            Self::Regenerate => "regenerate",
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.token() == token)
    }

    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            Self::Regenerate => "🔄 Regenerate",
            Self::Like => "👍 Like",
            Self::Dislike => "👎 Dislike",
        }
    }

    /// Toast shown after the button is pressed.
    pub fn acknowledgement(self) -> Option<&'static str> {
        match self {
            Self::Regenerate => None,
            Self::Like => Some("Thanks for your feedback! 😊"),
            Self::Dislike => Some("We're sorry to hear that. We'll try to improve! 😔"),
        }
    }
}

/// A pressed feedback button.
#[derive(Debug, Clone)]
pub struct FeedbackQuery {
    pub callback_id: String,
    /// The bot reply carrying the keyboard, if Telegram still has it.
    pub target: Option<(ChatId, MessageId)>,
    /// The user message that reply answered.
    pub original: Option<IncomingMessage>,
}
