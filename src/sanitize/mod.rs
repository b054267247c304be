//! Output sanitisation for text returned by the model.
//!
//! This module provides:
//! * [`NormalizationOptions`]: the three independent cleaning toggles.
//! * [`clean_string`]: applies the enabled toggles to a single string.
//! * [`normalize_response_payload`]: applies [`clean_string`] to every
//!   string inside an arbitrary JSON value.
//!
//! The toggles are always applied in the same order:
//!
//! ```text
//! normalize special characters ─▶ remove emojis ─▶ remove non-ASCII
//! ```
//!
//! Each step is a fixed point on its own output, so cleaning an already
//! cleaned string with the same options returns it unchanged.
//!
//! # Quick start
//!
//! ```rust
//! use openai_effects::sanitize::{clean_string, NormalizationOptions};
//!
//! let options = NormalizationOptions {
//!     normalize_special_chars: true,
//!     remove_emojis: true,
//!     remove_non_ascii: false,
//! };
//! assert_eq!(clean_string("Great—stream… 🎉", &options), "Great - stream... ");
//! ```

pub mod payload;
pub mod text;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use payload::normalize_response_payload;
pub use text::{
    clean_string, normalize_special_characters, remove_emojis, remove_non_ascii,
    NormalizationOptions,
};
