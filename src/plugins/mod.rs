//! Update handlers.
//!
//! - `start` - /start and /help commands
//! - `chatbot` - prompts and feedback buttons

pub mod chatbot;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::AppState;
use crate::chat::{FeedbackAction, IncomingMessage, RoutedMessage, route};

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "How to talk to me")]
    Help,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(start::help_command))
}

/// Build the prompt handler.
///
/// Only messages the router accepts reach the endpoint.
pub fn chat_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(|msg: Message, state: AppState| {
        let message = IncomingMessage::from_telegram(&msg);
        route(&message, state.bot_username()).map(|prompt| RoutedMessage { message, prompt })
    })
    .endpoint(chatbot::chat_message)
}

/// Build the callback query handler for feedback buttons.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query()
        .filter_map(|q: CallbackQuery| q.data.as_deref().and_then(FeedbackAction::from_token))
        .endpoint(chatbot::feedback_callback)
}
