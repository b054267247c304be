//! OpenAI API access for the effects.
//!
//! This module provides:
//! * [`OpenAiApi`]: async trait implemented by every client backend.
//! * [`OpenAiClient`]: reqwest implementation with a lazily built,
//!   memoised HTTP handle.
//! * [`ProviderResult`]: the `{error, response}` envelope every call returns.
//! * [`marshal`] / [`call_prompt`]: turn a Responses API reply into a typed
//!   value.
//! * Wire types for prompt, moderation and speech requests.
//! * Model and voice catalogs shown in the host's effect options.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use openai_effects::config::AppConfig;
//! use openai_effects::openai::{call_prompt, OpenAiClient, PromptRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap_or_default();
//!     let client = OpenAiClient::new(config.openai.clone(), Arc::new(config));
//!
//!     let request = PromptRequest::new("pmpt_123", None, "{}", "gpt-4o-mini");
//!     let result = call_prompt::<serde_json::Value>(&client, &request).await;
//!     println!("{:?}", result.response);
//! }
//! ```

pub mod client;
pub mod marshal;
#[cfg(test)]
pub mod mock;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{call_prompt, ClientError, OpenAiApi, OpenAiClient};
pub use marshal::{extract_json, marshal, message_text, MarshalError};
pub use types::{
    ContentItem, ModerationRequest, ModerationResponse, ModerationResult, OutputItem,
    PromptReference, PromptRequest, ProviderResult, RawProviderMessage, SpeechRequest,
    DEFAULT_MODERATION_MODEL, INSTRUCTION_TTS_MODEL, MAX_OUTPUT_TOKENS,
};

#[cfg(test)]
pub use mock::MockOpenAi;

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// Models offered for prompt execution.
pub const AVAILABLE_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];

pub const AVAILABLE_TTS_MODELS: &[&str] = &["tts-1", "tts-1-hd", INSTRUCTION_TTS_MODEL];

pub const AVAILABLE_VOICES: &[&str] = &[
    "alloy", "ash", "ballad", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer", "verse",
];

pub const AVAILABLE_MODERATION_MODELS: &[&str] =
    &[DEFAULT_MODERATION_MODEL, "text-moderation-latest"];
