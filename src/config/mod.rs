//! Configuration module for the fancychat bot.
//!
//! Loads configuration from environment variables (a `.env` file is honored).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::text::{FontStyle, LengthPolicy};

/// Errors raised while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Bot running mode
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<Url>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Bot username (without @) used for mention detection.
    /// Optional - will be fetched via getMe if not set.
    pub bot_username: Option<String>,

    // Generative API
    pub api_url: Url,
    pub api_timeout: Duration,
    /// Maximum API calls per second.
    pub rate_limit: u32,

    // Replies
    pub max_message_length: usize,
    pub length_policy: LengthPolicy,
    pub font_style: FontStyle,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub feedback_buttons: bool,

    // Decorations
    pub sticker_chance: f64,
    pub sticker_ids: Vec<String>,
    pub reaction_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build and validate the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let bot_mode = match vars
            .optional("BOT_MODE")
            .unwrap_or_else(|| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "polling" => BotMode::Polling,
            "webhook" => BotMode::Webhook,
            other => return Err(invalid("BOT_MODE", other, "expected polling or webhook")),
        };

        let webhook_url = vars
            .optional("WEBHOOK_URL")
            .map(|raw| parse_url("WEBHOOK_URL", &raw))
            .transpose()?;

        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        // Strip @ if present
        let bot_username = vars
            .optional("BOT_USERNAME")
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let api_url = parse_url("API_URL", &vars.required("API_URL")?)?;

        let rate_limit: u32 = vars.parse_or("RATE_LIMIT", 5)?;
        if rate_limit == 0 {
            return Err(invalid("RATE_LIMIT", "0", "must be at least 1"));
        }

        let max_message_length: usize = vars.parse_or("MAX_MESSAGE_LENGTH", 4096)?;
        if max_message_length < 4 {
            return Err(invalid(
                "MAX_MESSAGE_LENGTH",
                &max_message_length.to_string(),
                "must leave room for the ellipsis",
            ));
        }

        let word_limit: usize = vars.parse_or("WORD_LIMIT", 50)?;
        let length_policy = match vars
            .optional("REPLY_LENGTH_MODE")
            .unwrap_or_else(|| "chars".to_string())
            .to_lowercase()
            .as_str()
        {
            "chars" => LengthPolicy::Chars(max_message_length),
            "words" => LengthPolicy::Words(word_limit),
            "split" => LengthPolicy::Split,
            other => {
                return Err(invalid(
                    "REPLY_LENGTH_MODE",
                    other,
                    "expected chars, words or split",
                ));
            }
        };

        // NaN fails the range check too.
        let sticker_chance: f64 = vars.parse_or("STICKER_CHANCE", 0.3)?;
        if !(0.0..=1.0).contains(&sticker_chance) {
            return Err(invalid(
                "STICKER_CHANCE",
                &sticker_chance.to_string(),
                "must be within 0..=1",
            ));
        }

        let sticker_ids = vars
            .optional("STICKER_IDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            bot_token: vars.required("BOT_TOKEN")?,
            bot_mode,
            webhook_url,
            webhook_port: vars.parse_or("WEBHOOK_PORT", 8443)?,
            webhook_secret: vars.optional("WEBHOOK_SECRET"),
            bot_username,
            api_url,
            api_timeout: Duration::from_secs(vars.parse_or("API_TIMEOUT_SECS", 60)?),
            rate_limit,
            max_message_length,
            length_policy,
            font_style: vars.parse_or("FONT_STYLE", FontStyle::SmallCaps)?,
            cache_ttl: Duration::from_secs(vars.parse_or("CACHE_TTL_SECS", 3600)?),
            cache_capacity: vars.parse_or("CACHE_CAPACITY", 10_000)?,
            feedback_buttons: vars.parse_bool_or("FEEDBACK_BUTTONS", true)?,
            sticker_chance,
            sticker_ids,
            reaction_delay: Duration::from_millis(vars.parse_or("REACTION_DELAY_MS", 0)?),
        })
    }
}

/// Variable source with blank values treated as unset.
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
            None => Ok(default),
        }
    }

    fn parse_bool_or(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(name) {
            Some(raw) => {
                parse_flag(&raw).ok_or_else(|| invalid(name, &raw, "expected true or false"))
            }
            None => Ok(default),
        }
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| invalid(name, raw, &e.to_string()))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
