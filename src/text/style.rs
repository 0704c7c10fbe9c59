//! Font style tables for fancy text.

use std::fmt;
use std::str::FromStr;

/// Stylization applied to outgoing replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontStyle {
    /// Lowercase latin letters become small capitals (`ᴀʙᴄ`).
    #[default]
    SmallCaps,
    /// Latin letters of both cases become bold script (`𝓪𝓫𝓬`).
    Script,
    /// Text is sent as is.
    Plain,
}

impl FontStyle {
    /// Map a single character through this style.
    pub fn map_char(self, c: char) -> char {
        match self {
            Self::SmallCaps => small_cap(c),
            Self::Script => bold_script(c),
            Self::Plain => c,
        }
    }

    /// Apply the style to every character of `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Plain => text.to_string(),
            _ => text.chars().map(|c| self.map_char(c)).collect(),
        }
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small-caps" | "smallcaps" | "small_caps" => Ok(Self::SmallCaps),
            "script" | "cursive" => Ok(Self::Script),
            "plain" | "none" => Ok(Self::Plain),
            other => Err(format!("unknown font style {other:?}")),
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SmallCaps => "small-caps",
            Self::Script => "script",
            Self::Plain => "plain",
        })
    }
}

/// Small capitals for `a..=z`. `s` and `x` have no small capital in common
/// fonts and stay ASCII.
const SMALL_CAPS: [char; 26] = [
    'ᴀ', 'ʙ', 'ᴄ', 'ᴅ', 'ᴇ', 'ғ', 'ɢ', 'ʜ', 'ɪ', 'ᴊ', 'ᴋ', 'ʟ', 'ᴍ', 'ɴ', 'ᴏ', 'ᴘ', 'ǫ', 'ʀ', 's',
    'ᴛ', 'ᴜ', 'ᴠ', 'ᴡ', 'x', 'ʏ', 'ᴢ',
];

fn small_cap(c: char) -> char {
    if c.is_ascii_lowercase() {
        SMALL_CAPS[(c as u8 - b'a') as usize]
    } else {
        c
    }
}

/// Mathematical Bold Script block, contiguous for both cases.
const BOLD_SCRIPT_UPPER: u32 = 0x1D4D0;
const BOLD_SCRIPT_LOWER: u32 = 0x1D4EA;

fn bold_script(c: char) -> char {
    let base = if c.is_ascii_uppercase() {
        BOLD_SCRIPT_UPPER + u32::from(c as u8 - b'A')
    } else if c.is_ascii_lowercase() {
        BOLD_SCRIPT_LOWER + u32::from(c as u8 - b'a')
    } else {
        return c;
    };
    char::from_u32(base).unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_caps() {
        assert_eq!(FontStyle::SmallCaps.apply("hello, world!"), "ʜᴇʟʟᴏ, ᴡᴏʀʟᴅ!");
        assert_eq!(FontStyle::SmallCaps.apply("Sax 42"), "Sᴀx 42");
    }

    #[test]
    fn test_script_maps_both_cases() {
        assert_eq!(FontStyle::Script.apply("Az"), "𝓐𝔃");
        assert_eq!(FontStyle::Script.apply("1 + 1"), "1 + 1");
    }

    #[test]
    fn test_styles_are_idempotent() {
        let sample = "The quick brown fox jumps over the lazy dog. 0123 ✓ привет";
        for style in [FontStyle::SmallCaps, FontStyle::Script, FontStyle::Plain] {
            let once = style.apply(sample);
            assert_eq!(style.apply(&once), once, "{style} is not idempotent");
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Small-Caps".parse::<FontStyle>(), Ok(FontStyle::SmallCaps));
        assert_eq!("cursive".parse::<FontStyle>(), Ok(FontStyle::Script));
        assert_eq!("plain".parse::<FontStyle>(), Ok(FontStyle::Plain));
        assert!("gothic".parse::<FontStyle>().is_err());
    }
}
