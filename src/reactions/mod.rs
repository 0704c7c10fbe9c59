//! Decorative reactions and stickers for incoming messages.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Emoji the bot reacts with.
pub const EMOJI: &[&str] = &[
    "👍", "👎", "❤️", "🔥", "🥳", "👏", "😁", "😂", "😲", "😱", "😢", "😭", "🎉", "😇", "😍",
    "😅", "💩", "🙏", "🤝", "🍓", "🎃", "👀", "💯", "😎", "🤖", "🐵", "👻", "🎄", "🥂", "🎅",
    "❄️", "✍️", "🎁", "🤔", "💔", "🥰", "🥺", "🙈", "🤡", "😋", "🎊", "🍾", "🌟", "👶", "🦄",
    "💤", "😷", "👨‍💻", "🍌", "💀", "👨‍🏫", "☠️", "🎯", "🍕", "🦾", "💃",
];

/// A decoration chosen for one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoration {
    /// Emoji reaction set on the message.
    Reaction(&'static str),
    /// Sticker file id sent as a reply.
    Sticker(String),
}

/// Picks decorations at random.
#[derive(Debug)]
pub struct Decorator {
    sticker_chance: f64,
    stickers: Vec<String>,
    rng: Mutex<StdRng>,
}

impl Decorator {
    /// Create a decorator seeded from system entropy.
    pub fn new(sticker_chance: f64, stickers: Vec<String>) -> Self {
        Self::with_rng(sticker_chance, stickers, StdRng::from_entropy())
    }

    /// Create a decorator with an explicit RNG.
    pub fn with_rng(sticker_chance: f64, stickers: Vec<String>, rng: StdRng) -> Self {
        Self {
            sticker_chance: sticker_chance.clamp(0.0, 1.0),
            stickers,
            rng: Mutex::new(rng),
        }
    }

    /// Uniformly pick one emoji from [`EMOJI`].
    pub fn pick_reaction(&self) -> &'static str {
        let mut rng = self.rng.lock();
        EMOJI.choose(&mut *rng).copied().unwrap_or("👍")
    }

    /// Pick a sticker with the configured chance, otherwise an emoji.
    ///
    /// Without configured stickers this always yields an emoji.
    pub fn pick_reaction_or_sticker(&self) -> Decoration {
        if !self.stickers.is_empty() {
            let mut rng = self.rng.lock();
            if rng.gen_bool(self.sticker_chance)
                && let Some(sticker) = self.stickers.choose(&mut *rng)
            {
                return Decoration::Sticker(sticker.clone());
            }
        }
        Decoration::Reaction(self.pick_reaction())
    }
}
