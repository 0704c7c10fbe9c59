//! /start and /help command plugin.
//!
//! Greets the user in the bot's fancy font.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::bot::dispatcher::{AppState, ThrottledBot};

const START_TEXT: &str = "Hello! I'm an AI chatbot. Send me a message and I'll answer.";

const HELP_TEXT: &str = "Talk to me in private chat. Use the buttons under my answers to \
    regenerate or rate them. In groups, reply to one of my messages or mention me:";

/// Help text with the mention kept out of the fancy font so it stays clickable.
fn help_text(styled_help: &str, bot_username: &str) -> String {
    format!("{styled_help}\n@{bot_username}")
}

/// Handle the /start command.
pub async fn start_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let text = state.pipeline.formatter().format(START_TEXT);

    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

/// Handle the /help command.
pub async fn help_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let styled = state.pipeline.formatter().format(HELP_TEXT);
    let text = help_text(&styled, state.bot_username());

    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_mentions_bot() {
        let text = help_text("ɪɴ ɢʀᴏᴜᴘs, ᴍᴇɴᴛɪᴏɴ ᴍᴇ:", "fancy_bot");
        assert!(text.ends_with("\n@fancy_bot"));
    }
}
