//! Fancychat - Telegram chatbot in fancy text.
//!
//! Relays private messages, and group messages that mention or reply to the
//! bot, to a generative API and answers in a stylized font.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `cache` - Bounded TTL caches with Moka
//! - `limiter` - Token bucket for generative API calls
//! - `text` - Fancy font styles and reply truncation
//! - `reactions` - Random emoji reactions and stickers
//! - `api` - Generative API client
//! - `transport` - Outbound Telegram calls and long-message splitting
//! - `chat` - Routing, the per-message pipeline and feedback buttons
//! - `bot` - Dispatcher and runtime (with Throttle for Telegram rate limits)
//! - `plugins` - Update handlers

mod api;
mod bot;
mod cache;
mod chat;
mod config;
mod limiter;
mod plugins;
mod reactions;
mod text;
mod transport;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::HttpGenerativeApi;
use bot::AppState;
use chat::{ChatPipeline, PipelineOptions};
use config::Config;
use limiter::RateLimiter;
use reactions::Decorator;
use text::Formatter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fancychat=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting fancychat bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    // Throttle keeps us within Telegram's own limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("Using bot username: @{}", bot_username);

    let api = HttpGenerativeApi::new(config.api_url.clone(), config.api_timeout)?;
    info!("Generative API endpoint: {}", config.api_url);

    let limiter = RateLimiter::new(config.rate_limit);
    info!("API rate limit: {}/s", limiter.rate());

    let formatter = Formatter::new(
        config.font_style,
        config.length_policy,
        config.cache_capacity,
        config.cache_ttl,
    );
    info!(
        "Replies in {} style, length policy {:?}",
        config.font_style, config.length_policy
    );

    let decorator = Decorator::new(config.sticker_chance, config.sticker_ids.clone());
    info!(
        "Sticker chance {} with {} sticker(s)",
        config.sticker_chance,
        config.sticker_ids.len()
    );

    let pipeline = ChatPipeline::new(
        Arc::new(bot.clone()),
        Arc::new(api),
        limiter,
        formatter,
        decorator,
        PipelineOptions {
            bot_username,
            feedback_buttons: config.feedback_buttons,
            reaction_delay: config.reaction_delay,
            max_message_length: config.max_message_length,
        },
    );

    let dispatcher = bot::build_dispatcher(bot.clone(), AppState::new(pipeline));

    bot::run(&config, bot, dispatcher).await
}
