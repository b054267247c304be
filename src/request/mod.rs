//! Structured, injection-resistant request bodies for prompt execution.
//!
//! Every prompt request is wrapped in the same three-field envelope:
//!
//! ```text
//! {
//!   "system_input": <SYSTEM_INPUT guard sentence>,
//!   "user_input":   <trimmed text>  |  { <key>: <value>, ... },
//!   "username":     <trigger username or "Unknown">
//! }
//! ```
//!
//! This module provides:
//! * [`InputMapping`] / [`validate_mappings`]: user-defined key/value inputs
//!   and their reserved-keyword, emptiness and duplicate checks.
//! * [`StructuredRequest`] / [`UserInput`]: the envelope itself.
//! * [`MaxLength`]: the optional size limit on the serialised envelope.
//! * [`RequestError`]: everything that can go wrong before dispatch.

pub mod envelope;
pub mod mapping;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use envelope::{
    coerce_value, MaxLength, MaxLengthSetting, StructuredRequest, UserInput, SYSTEM_INPUT,
    UNKNOWN_USERNAME,
};
pub use mapping::{is_reserved_key, validate_mappings, InputMapping, RESERVED_KEYS};

// ---------------------------------------------------------------------------
// RequestError
// ---------------------------------------------------------------------------

/// Errors raised while validating inputs or building the request body.
///
/// None of these ever reach the remote API: they are reported as
/// configuration errors before any request is made.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A mapping key is blank after trimming (`index` is 1-based).
    #[error("Input #{index} is missing a key")]
    EmptyKey { index: usize },

    /// A mapping value is blank after trimming.
    #[error("Input '{key}' is missing a value")]
    EmptyValue { key: String },

    /// A mapping key collides with a field of the request envelope or a
    /// known instruction-override keyword.
    #[error("Input key '{key}' is reserved and cannot be used")]
    ReservedKey { key: String },

    /// The same trimmed key appears more than once.
    #[error("Input key '{key}' is used more than once")]
    DuplicateKey { key: String },

    /// The configured maximum length is negative or not a number.
    #[error("Maximum Input Length must be zero or a positive number")]
    InvalidMaxLength,

    /// The serialised request body is longer than the configured maximum.
    #[error("Input exceeds maximum length of {max} characters")]
    TooLong { max: usize, actual: usize },

    /// The envelope could not be serialised.
    #[error("failed to serialise request: {0}")]
    Serialize(#[from] serde_json::Error),
}
