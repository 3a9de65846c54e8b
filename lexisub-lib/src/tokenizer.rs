//! Word tokenization and status colouring

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vocab::VocabStatus;

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Separator,
}

/// A run of segment text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Lowercased cache key (words only; separators carry their text unchanged)
    pub normalized: String,
    /// Original text, exactly as it appeared
    pub display: String,
}

impl Token {
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Split text into maximal word and separator runs.
///
/// Concatenating every token's `display` reproduces the input exactly.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut run_start = 0;
    let mut run_is_word: Option<bool> = None;

    for (idx, c) in text.char_indices() {
        let word = is_word_char(c);
        match run_is_word {
            Some(current) if current == word => {}
            Some(current) => {
                tokens.push(make_token(&text[run_start..idx], current));
                run_start = idx;
                run_is_word = Some(word);
            }
            None => run_is_word = Some(word),
        }
    }

    if let Some(current) = run_is_word {
        tokens.push(make_token(&text[run_start..], current));
    }

    tokens
}

fn make_token(run: &str, is_word: bool) -> Token {
    if is_word {
        Token {
            kind: TokenKind::Word,
            normalized: normalize_word(run),
            display: run.to_string(),
        }
    } else {
        Token {
            kind: TokenKind::Separator,
            normalized: run.to_string(),
            display: run.to_string(),
        }
    }
}

/// Lowercase form used as the vocabulary key.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| is_word_char(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// The distinct normalized words of a text, in first-seen order.
pub fn unique_words(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(Token::is_word)
        .filter_map(|t| seen.insert(t.normalized.clone()).then_some(t.normalized))
        .collect()
}

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear per-channel blend toward white; `intensity` 1.0 keeps `self`,
    /// 0.0 yields white.
    pub fn blend_with_white(self, intensity: f64) -> Rgb {
        let w = intensity.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f64 * w + 255.0 * (1.0 - w)).round() as u8;
        Rgb::new(mix(self.r), mix(self.g), mix(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Highlight colour for words still being learnt
pub const BRAND_COLOR: Rgb = Rgb::new(255, 107, 53);

/// Colour for words the learner already knows
pub const KNOWN_COLOR: Rgb = Rgb::new(229, 231, 235);

/// Blend weight toward the brand colour for each learning status.
pub fn status_intensity(status: VocabStatus) -> f64 {
    match status {
        VocabStatus::New | VocabStatus::Unknown => 1.0,
        VocabStatus::Recognised => 0.6,
        VocabStatus::Familiar => 0.3,
        VocabStatus::Known => 0.0,
    }
}

/// Display colour for a vocabulary status.
pub fn color_for(status: VocabStatus) -> Rgb {
    match status {
        VocabStatus::Known => KNOWN_COLOR,
        other => BRAND_COLOR.blend_with_white(status_intensity(other)),
    }
}
