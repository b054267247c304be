//! Recursive cleaning of JSON-shaped values.

use serde_json::Value;

use super::text::{clean_string, NormalizationOptions};

/// Clean every string inside `payload`, keeping its shape.
///
/// * strings are passed through [`clean_string`];
/// * arrays are mapped element-wise;
/// * objects are mapped value-wise, keys and key order preserved;
/// * numbers, booleans and `null` are returned unchanged.
///
/// JSON values are trees, so recursion always terminates.
pub fn normalize_response_payload(payload: &Value, options: &NormalizationOptions) -> Value {
    match payload {
        Value::String(text) => Value::String(clean_string(text, options)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize_response_payload(item, options))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), normalize_response_payload(value, options)))
                .collect(),
        ),
        other => other.clone(),
    }
}
