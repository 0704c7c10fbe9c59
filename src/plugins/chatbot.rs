//! Chatbot handlers.
//!
//! Hands routed messages and feedback presses to the chat pipeline.

use teloxide::prelude::*;
use tracing::info;

use crate::bot::dispatcher::AppState;
use crate::chat::{FeedbackAction, FeedbackQuery, IncomingMessage, Outcome, RoutedMessage};

/// Answer a routed private or group message.
pub async fn chat_message(state: AppState, routed: RoutedMessage) -> anyhow::Result<()> {
    let RoutedMessage { message, prompt } = routed;

    let outcome = state.pipeline.handle(&message, &prompt).await;
    log_outcome(&message, outcome);

    Ok(())
}

/// Handle a regenerate/like/dislike press.
pub async fn feedback_callback(
    state: AppState,
    q: CallbackQuery,
    action: FeedbackAction,
) -> anyhow::Result<()> {
    let original = q
        .regular_message()
        .and_then(|m| m.reply_to_message())
        .map(IncomingMessage::from_telegram);

    let regenerated = original.clone();
    let query = FeedbackQuery {
        target: q.message.as_ref().map(|m| (m.chat().id, m.id())),
        callback_id: q.id,
        original,
    };

    if let Some(outcome) = state.pipeline.handle_feedback(action, query).await
        && let Some(message) = regenerated.as_ref()
    {
        log_outcome(message, outcome);
    }

    Ok(())
}

fn log_outcome(message: &IncomingMessage, outcome: Outcome) {
    match outcome {
        Outcome::Replied { photo, chunks } => info!(
            "Replied to message {} in chat {} (photo: {}, chunks: {})",
            message.message_id.0, message.chat_id.0, photo, chunks
        ),
        Outcome::Failed(failure) => info!(
            "Message {} in chat {} ended without reply: {:?}",
            message.message_id.0, message.chat_id.0, failure
        ),
    }
}
