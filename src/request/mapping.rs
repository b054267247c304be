//! User-defined key/value inputs and their validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::RequestError;

/// Keys that may never be used as input names (compared lower-cased).
///
/// The first three are the envelope's own fields; the rest are common
/// instruction-override handles.
pub const RESERVED_KEYS: &[&str] = &[
    "system_input",
    "user_input",
    "username",
    "system",
    "prompt",
    "instruction",
    "instruction_override",
    "system_prompt",
    "jailbreak",
];

// ---------------------------------------------------------------------------
// InputMapping
// ---------------------------------------------------------------------------

/// One user-defined input: a plain identifier and a (host-substituted) value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputMapping {
    pub key: String,
    pub value: String,
}

impl InputMapping {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The trimmed `(key, value)` pair, or `None` when either side is blank.
    pub fn trimmed(&self) -> Option<(&str, &str)> {
        let key = self.key.trim();
        let value = self.value.trim();
        if key.is_empty() || value.is_empty() {
            None
        } else {
            Some((key, value))
        }
    }
}

/// Returns `true` when `key` (trimmed, case-insensitive) is reserved.
pub fn is_reserved_key(key: &str) -> bool {
    let lowered = key.trim().to_lowercase();
    RESERVED_KEYS.contains(&lowered.as_str())
}

/// Check every mapping and return all problems found, in input order.
///
/// An empty result means the list can be turned into a request envelope
/// without dropping anything.
pub fn validate_mappings(mappings: &[InputMapping]) -> Vec<RequestError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (position, mapping) in mappings.iter().enumerate() {
        let key = mapping.key.trim();
        if key.is_empty() {
            errors.push(RequestError::EmptyKey {
                index: position + 1,
            });
            continue;
        }
        if is_reserved_key(key) {
            errors.push(RequestError::ReservedKey {
                key: key.to_string(),
            });
        } else if !seen.insert(key) {
            errors.push(RequestError::DuplicateKey {
                key: key.to_string(),
            });
        }
        if mapping.value.trim().is_empty() {
            errors.push(RequestError::EmptyValue {
                key: key.to_string(),
            });
        }
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
