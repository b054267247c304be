//! String-level cleaning: dash/ellipsis normalisation, emoji stripping and
//! non-ASCII stripping.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

/// Hyphen variants, figure/en/em dashes, horizontal bar, minus sign, small
/// and full-width hyphen-minus.  The plain ASCII `-` is deliberately absent.
const DASH_CLASS: &str = r"[\x{2010}-\x{2015}\x{2212}\x{FE58}\x{FE63}\x{FF0D}]";

/// A dash run squeezed between two non-space characters, with optional
/// whitespace on either side: `word—word`, `word – word`.
static SPACED_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(\S)\s*{DASH_CLASS}+\s*(\S)")).expect("dash pattern is valid")
});

static DASH: Lazy<Regex> = Lazy::new(|| Regex::new(DASH_CLASS).expect("dash class is valid"));

/// Extended pictographics, emoji-presentation characters and VS16.
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Presentation}\x{FE0F}]")
        .expect("emoji class is valid")
});

const ELLIPSIS: char = '\u{2026}';

// ---------------------------------------------------------------------------
// NormalizationOptions
// ---------------------------------------------------------------------------

/// Independent, composable cleaning toggles.
///
/// Deserialises from the camelCase effect configuration keys
/// (`normalizeSpecialChars`, `removeEmojis`, `removeNonAscii`); missing keys
/// default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizationOptions {
    /// Rewrite dash variants to `-` / ` - ` and `…` to `...`.
    pub normalize_special_chars: bool,
    /// Strip emoji and pictographic characters.
    pub remove_emojis: bool,
    /// Strip everything outside `0x00..=0x7F`.
    pub remove_non_ascii: bool,
}

impl NormalizationOptions {
    /// Returns `true` when at least one toggle is on.
    pub fn any_enabled(&self) -> bool {
        self.normalize_special_chars || self.remove_emojis || self.remove_non_ascii
    }
}

// ---------------------------------------------------------------------------
// Cleaning steps
// ---------------------------------------------------------------------------

/// Normalise dash-like characters and the Unicode ellipsis.
///
/// ```rust
/// use openai_effects::sanitize::normalize_special_characters;
///
/// assert_eq!(normalize_special_characters("one—two"), "one - two");
/// assert_eq!(normalize_special_characters("x—y—z"), "x - y - z");
/// assert_eq!(normalize_special_characters("\u{2212}5"), "-5");
/// assert_eq!(normalize_special_characters("wait\u{2026}"), "wait...");
/// assert_eq!(normalize_special_characters("co-op"), "co-op");
/// ```
pub fn normalize_special_characters(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    // Each match consumes its right-hand neighbour, so a chain like `x—y—z`
    // needs another pass for every dash after the first.
    let mut spaced = text.to_string();
    while SPACED_DASH.is_match(&spaced) {
        spaced = SPACED_DASH.replace_all(&spaced, "${1} - ${2}").into_owned();
    }
    let dashed = DASH.replace_all(&spaced, "-");
    dashed.replace(ELLIPSIS, "...")
}

/// Strip emoji, pictographs and the emoji variation selector.
pub fn remove_emojis(text: &str) -> String {
    EMOJI.replace_all(text, "").into_owned()
}

/// Keep only 7-bit ASCII characters.
pub fn remove_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Apply every enabled step of `options` to `text`, in the fixed order
/// special characters → emojis → non-ASCII.
pub fn clean_string(text: &str, options: &NormalizationOptions) -> String {
    let mut updated = text.to_string();
    if options.normalize_special_chars {
        updated = normalize_special_characters(&updated);
    }
    if options.remove_emojis {
        updated = remove_emojis(&updated);
    }
    if options.remove_non_ascii {
        updated = remove_non_ascii(&updated);
    }
    updated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
