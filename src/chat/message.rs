//! Incoming message model and routing rules.

use std::ops::Range;

use teloxide::types::{ChatId, Message, MessageId, MessageKind};

/// Kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    /// Channels and anything else the bot ignores.
    Other,
}

/// Read-only view of an incoming Telegram message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub sender_id: Option<u64>,
    pub sender_username: Option<String>,
    pub text: Option<String>,
    /// Service messages (joins, pins, ...) are never answered.
    pub is_service: bool,
    pub reply_to: Option<Box<IncomingMessage>>,
}

impl IncomingMessage {
    /// Convert a teloxide message, including the message it replies to.
    pub fn from_telegram(msg: &Message) -> Self {
        let chat_kind = if msg.chat.is_private() {
            ChatKind::Private
        } else if msg.chat.is_group() || msg.chat.is_supergroup() {
            ChatKind::Group
        } else {
            ChatKind::Other
        };

        Self {
            chat_id: msg.chat.id,
            chat_kind,
            message_id: msg.id,
            sender_id: msg.from.as_ref().map(|u| u.id.0),
            sender_username: msg.from.as_ref().and_then(|u| u.username.clone()),
            text: msg.text().map(str::to_string),
            is_service: !matches!(msg.kind, MessageKind::Common(_)),
            reply_to: msg
                .reply_to_message()
                .map(|reply| Box::new(Self::from_telegram(reply))),
        }
    }

    /// Whether this message replies to a message sent by `bot_username`.
    pub fn replies_to(&self, bot_username: &str) -> bool {
        self.reply_to
            .as_ref()
            .and_then(|reply| reply.sender_username.as_deref())
            .is_some_and(|name| name.eq_ignore_ascii_case(bot_username))
    }
}

/// A message accepted by the router, with the prompt extracted from it.
#[derive(Debug, Clone)]
pub struct RoutedMessage {
    pub message: IncomingMessage,
    pub prompt: String,
}

/// Byte ranges of every `@bot_username` mention in `text`.
///
/// Usernames compare case-insensitively and must end at a word boundary, so
/// `@fancy_bot2` is not a mention of `fancy_bot`.
fn mentions(text: &str, bot_username: &str) -> Vec<Range<usize>> {
    if bot_username.is_empty() {
        return Vec::new();
    }

    text.match_indices('@')
        .filter_map(|(start, _)| {
            let end = start + 1 + bot_username.len();
            let name = text.get(start + 1..end)?;
            let bounded = !text[end..].starts_with(|c: char| c.is_alphanumeric() || c == '_');
            (bounded && name.eq_ignore_ascii_case(bot_username)).then_some(start..end)
        })
        .collect()
}

/// Whether `text` mentions `bot_username`.
pub fn mentions_bot(text: &str, bot_username: &str) -> bool {
    !mentions(text, bot_username).is_empty()
}

/// Remove every `@bot_username` mention and trim the rest.
pub fn strip_mention(text: &str, bot_username: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for range in mentions(text, bot_username) {
        out.push_str(&text[last..range.start]);
        last = range.end;
    }
    out.push_str(&text[last..]);
    out.trim().to_string()
}

/// Decide whether the bot answers `msg`, returning the prompt if so.
///
/// Private chats: every non-service text message. Groups: text messages that
/// reply to the bot or mention it by username.
pub fn route(msg: &IncomingMessage, bot_username: &str) -> Option<String> {
    let text = msg.text.as_deref()?;

    let accepted = match msg.chat_kind {
        ChatKind::Private => !msg.is_service,
        ChatKind::Group => msg.replies_to(bot_username) || mentions_bot(text, bot_username),
        ChatKind::Other => false,
    };

    accepted.then(|| strip_mention(text, bot_username))
}
