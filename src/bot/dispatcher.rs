//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command, chat and feedback handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::api::HttpGenerativeApi;
use crate::chat::ChatPipeline;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// The production pipeline: Telegram out, HTTP generative API in.
pub type BotPipeline = ChatPipeline<ThrottledBot, HttpGenerativeApi>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Chat pipeline shared by every handler.
    pub pipeline: Arc<BotPipeline>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(pipeline: BotPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Bot username (without @).
    pub fn bot_username(&self) -> &str {
        self.pipeline.bot_username()
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    // Commands first, everything else may be a prompt
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(plugins::chat_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(plugins::callback_handler())
}
