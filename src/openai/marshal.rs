//! Response marshaller: pulls the single JSON value a prompt produced out of
//! the Responses API reply and deserialises it.
//!
//! The model's text is located at `output[first "message"].content[0].text`.
//! When that text contains a fenced code block (optionally tagged `json`) the
//! fenced interior is parsed; otherwise the whole text is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::RawProviderMessage;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("code fence pattern is valid")
});

// ---------------------------------------------------------------------------
// MarshalError
// ---------------------------------------------------------------------------

/// Every way a provider reply can fail to yield the expected value.
///
/// Structural problems ("nothing there") and [`MarshalError::Json`]
/// ("something there, but not valid JSON") are separate variants with
/// distinct messages.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("Invalid OpenAI response: no output")]
    NoOutput,

    #[error("Invalid OpenAI response: no message content")]
    NoMessage,

    #[error("Invalid OpenAI response: no content in message")]
    EmptyContent,

    #[error("Invalid OpenAI response: no text content")]
    NoText,

    #[error("Failed to marshal response to expected type: {0}")]
    Json(#[source] serde_json::Error),
}

impl MarshalError {
    /// `true` for a malformed-JSON failure, `false` for a missing/empty reply.
    pub fn is_malformed_json(&self) -> bool {
        matches!(self, MarshalError::Json(_))
    }
}

// ---------------------------------------------------------------------------
// Marshalling
// ---------------------------------------------------------------------------

/// Text of the first content item of the first `message` output entry.
pub fn message_text(raw: &RawProviderMessage) -> Result<&str, MarshalError> {
    let output = raw
        .output
        .as_deref()
        .filter(|items| !items.is_empty())
        .ok_or(MarshalError::NoOutput)?;

    let message = output
        .iter()
        .find(|item| item.kind == "message")
        .ok_or(MarshalError::NoMessage)?;

    let content = message
        .content
        .as_deref()
        .filter(|items| !items.is_empty())
        .ok_or(MarshalError::EmptyContent)?;

    content[0]
        .text
        .as_deref()
        .filter(|text| !text.is_empty())
        .ok_or(MarshalError::NoText)
}

/// The JSON candidate inside `text`: the first fenced block's interior, or
/// the whole text when there is no fence.
pub fn extract_json(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

/// Deserialise the JSON value embedded in a provider reply.
pub fn marshal<T: DeserializeOwned>(raw: &RawProviderMessage) -> Result<T, MarshalError> {
    let text = message_text(raw)?;
    let candidate = extract_json(text);

    serde_json::from_str(candidate).map_err(|err| {
        log::error!("Failed to parse JSON from OpenAI response: {err}");
        log::debug!("Response text: {text}");
        MarshalError::Json(err)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Scores {
        english_score: u32,
        troll_score: u32,
        content_score: u32,
    }

    fn reply(text: &str) -> RawProviderMessage {
        serde_json::from_value(json!({
            "output": [
                { "type": "reasoning", "summary": [] },
                { "type": "message", "content": [{ "type": "output_text", "text": text }] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn fenced_json_block_is_unwrapped() {
        let raw = reply("```json\n{\"english_score\":100,\"troll_score\":20,\"content_score\":1}\n```");
        let scores: Scores = marshal(&raw).unwrap();
        assert_eq!(
            scores,
            Scores {
                english_score: 100,
                troll_score: 20,
                content_score: 1
            }
        );
    }

    #[test]
    fn untagged_fence_and_surrounding_prose() {
        let raw = reply("Here you go:\n```\n{\"ok\": true}\n```\nAnything else?");
        let value: Value = marshal(&raw).unwrap();
        assert_eq!(value, json!({ "ok": true }));
    }

    #[test]
    fn bare_json_text_is_parsed_directly() {
        let raw = reply("{\"score\":85,\"category\":\"excellent\"}");
        let value: Value = marshal(&raw).unwrap();
        assert_eq!(value, json!({ "score": 85, "category": "excellent" }));
    }

    #[test]
    fn malformed_json_is_distinguishable() {
        let err = marshal::<Value>(&reply("this is not json")).unwrap_err();
        assert!(err.is_malformed_json());
        assert!(err
            .to_string()
            .starts_with("Failed to marshal response to expected type:"));
    }

    #[test]
    fn wrong_shape_is_a_json_error() {
        let err = marshal::<Scores>(&reply("{\"english_score\": \"high\"}")).unwrap_err();
        assert!(err.is_malformed_json());
    }

    #[test]
    fn missing_output_variants_have_distinct_messages() {
        let no_output = RawProviderMessage::default();
        let empty_output: RawProviderMessage = serde_json::from_value(json!({ "output": [] })).unwrap();
        let no_message: RawProviderMessage =
            serde_json::from_value(json!({ "output": [{ "type": "reasoning" }] })).unwrap();
        let empty_content: RawProviderMessage =
            serde_json::from_value(json!({ "output": [{ "type": "message", "content": [] }] })).unwrap();
        let no_text: RawProviderMessage = serde_json::from_value(
            json!({ "output": [{ "type": "message", "content": [{ "type": "refusal" }] }] }),
        )
        .unwrap();

        let messages: Vec<String> = [no_output, empty_output, no_message, empty_content, no_text]
            .iter()
            .map(|raw| {
                let err = marshal::<Value>(raw).unwrap_err();
                assert!(!err.is_malformed_json());
                err.to_string()
            })
            .collect();

        assert_eq!(messages[0], "Invalid OpenAI response: no output");
        assert_eq!(messages[1], "Invalid OpenAI response: no output");
        assert_eq!(messages[2], "Invalid OpenAI response: no message content");
        assert_eq!(messages[3], "Invalid OpenAI response: no content in message");
        assert_eq!(messages[4], "Invalid OpenAI response: no text content");
    }

    #[test]
    fn extract_json_without_fence_returns_input() {
        assert_eq!(extract_json("[1,2]"), "[1,2]");
        assert_eq!(extract_json("```json\n[1]\n```"), "[1]");
    }
}
