//! Reply length policies.

/// Appended when a reply was cut short.
pub const ELLIPSIS: &str = "...";

/// How overlong replies are shortened. One unit per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Keep at most this many characters, ellipsis included.
    Chars(usize),
    /// Keep at most this many whitespace-separated words, then the ellipsis.
    Words(usize),
    /// Never truncate; long replies are split across several messages.
    Split,
}

impl LengthPolicy {
    /// Apply the policy to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Chars(limit) => truncate_chars(text, limit),
            Self::Words(limit) => truncate_words(text, limit),
            Self::Split => text.to_string(),
        }
    }
}

/// Cut `text` to `limit` characters, the last three being the ellipsis.
///
/// Below three characters there is no room for the ellipsis and the text is
/// simply clipped.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit < ELLIPSIS.len() {
        return text.chars().take(limit).collect();
    }
    let keep = limit - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Length as Telegram counts it, in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Cut `text` to at most `limit` UTF-16 code units, ellipsis included.
///
/// Astral characters (the bold script alphabet, most emoji) take two units.
pub fn truncate_units(text: &str, limit: usize) -> String {
    if utf16_len(text) <= limit {
        return text.to_string();
    }
    let (budget, ellipsis) = if limit < ELLIPSIS.len() {
        (limit, "")
    } else {
        (limit - ELLIPSIS.len(), ELLIPSIS)
    };

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push_str(ellipsis);
    out
}

/// Keep the first `limit` words joined by single spaces.
pub fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return text.to_string();
    }
    let mut out = words[..limit].join(" ");
    out.push_str(ELLIPSIS);
    out
}
