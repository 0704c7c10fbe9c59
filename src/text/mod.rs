//! Reply text formatting.
//!
//! Replies are shortened according to the deployment's [`LengthPolicy`] and
//! then rendered in the configured [`FontStyle`]. Text containing a link is
//! never stylized, since restyled URLs stop being clickable.

mod style;
mod truncate;

pub use style::FontStyle;
pub use truncate::{LengthPolicy, truncate_units, utf16_len};

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").expect("valid link regex"));

/// Check whether `text` contains an http(s) link anywhere.
pub fn contains_link(text: &str) -> bool {
    LINK.is_match(text)
}

/// Formats replies and caches rendered text.
#[derive(Debug, Clone)]
pub struct Formatter {
    style: FontStyle,
    length: LengthPolicy,
    cache: TypedCache<String, String>,
}

impl Formatter {
    /// Create a formatter with its own rendered-text cache.
    pub fn new(
        style: FontStyle,
        length: LengthPolicy,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Self {
        let cache = TypedCache::new(
            "fancy_text",
            CacheConfig::rendered_text(cache_capacity, cache_ttl),
        );
        debug!("Formatter using {} style with cache '{}'", style, cache.name());

        Self {
            style,
            length,
            cache,
        }
    }

    /// Active length policy.
    pub fn length_policy(&self) -> LengthPolicy {
        self.length
    }

    /// Stylize `text`, leaving it untouched if it contains a link.
    pub fn format(&self, text: &str) -> String {
        if contains_link(text) || self.style == FontStyle::Plain {
            return text.to_string();
        }

        let style = self.style;
        self.cache.get_or_insert_with(text.to_string(), || style.apply(text))
    }

    /// Shorten `text` according to the length policy.
    pub fn truncate(&self, text: &str) -> String {
        self.length.apply(text)
    }

    /// Truncate, then format: the full treatment for an API result.
    pub fn render(&self, text: &str) -> String {
        self.format(&self.truncate(text))
    }

    /// Render, then clip to `max_units` UTF-16 code units.
    ///
    /// Word limits and styles with astral glyphs can both leave a reply
    /// longer than Telegram accepts; this is the final bound.
    pub fn render_within(&self, text: &str, max_units: usize) -> String {
        truncate_units(&self.render(text), max_units)
    }
}
