//! Wire types for the OpenAI Responses, Moderations and Audio Speech APIs,
//! plus the [`ProviderResult`] envelope every client call returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output-token ceiling sent with every prompt execution.
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

/// The only TTS model that accepts style `instructions`.
pub const INSTRUCTION_TTS_MODEL: &str = "gpt-4o-mini-tts";

pub const DEFAULT_MODERATION_MODEL: &str = "omni-moderation-latest";

// ---------------------------------------------------------------------------
// ProviderResult
// ---------------------------------------------------------------------------

/// Outcome of one remote call: an error message *or* a response.
///
/// A non-empty `error` always comes with `response == None`.  An empty
/// `error` normally comes with a response; callers must still treat a
/// missing response as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult<T> {
    pub error: String,
    pub response: Option<T>,
}

impl<T> ProviderResult<T> {
    pub fn ok(response: T) -> Self {
        Self {
            error: String::new(),
            response: Some(response),
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            response: None,
        }
    }

    pub fn is_err(&self) -> bool {
        !self.error.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Prompt execution (Responses API)
// ---------------------------------------------------------------------------

/// Reference to a stored prompt.  `version` is omitted from the wire body
/// entirely when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Body of `POST /v1/responses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub model: String,
    /// The serialised request envelope.
    pub input: String,
    pub max_output_tokens: u32,
    pub prompt: PromptReference,
}

impl PromptRequest {
    /// Build a request; a blank `version` is treated as unset.
    pub fn new(
        prompt_id: impl Into<String>,
        version: Option<&str>,
        input: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let version = version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self {
            model: model.into(),
            input: input.into(),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            prompt: PromptReference {
                id: prompt_id.into(),
                version,
            },
        }
    }
}

/// The parts of a Responses API reply the marshaller looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProviderMessage {
    #[serde(default)]
    pub output: Option<Vec<OutputItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: Option<Vec<ContentItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

/// Body of `POST /v1/moderations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub input: String,
    pub model: String,
}

/// Reply of the moderation endpoint.  Fields this crate does not interpret
/// are kept in `extra` so the full result can be handed back to the host.
/// Defaulted fields the provider left out are not written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(default)]
    pub results: Vec<ModerationResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModerationResponse {
    /// `flagged` of the first result, if there is one and it carries the
    /// field.
    pub fn first_flagged(&self) -> Option<bool> {
        self.results.first().and_then(|result| result.flagged)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub categories: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub category_scores: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Speech synthesis
// ---------------------------------------------------------------------------

/// Body of `POST /v1/audio/speech`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
    pub speed: f64,
    pub response_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl SpeechRequest {
    /// Build an mp3 request.  `prompt` becomes `instructions` only for
    /// [`INSTRUCTION_TTS_MODEL`] and only when non-blank.
    pub fn new(model: &str, voice: &str, text: &str, speed: f64, prompt: Option<&str>) -> Self {
        let instructions = prompt
            .filter(|p| model == INSTRUCTION_TTS_MODEL && !p.trim().is_empty())
            .map(str::to_string);
        Self {
            model: model.to_string(),
            voice: voice.to_string(),
            input: text.to_string(),
            speed,
            response_format: "mp3".into(),
            instructions,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
