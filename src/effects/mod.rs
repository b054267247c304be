//! Host-facing effects: Run Prompt, Moderate Text and Text to Speech.
//!
//! Every effect follows the same single-shot flow, tracked by
//! [`InvocationTrace`]:
//!
//! ```text
//! options (JSON) ─▶ Validating ─▶ BuildingRequest ─▶ Invoking ─▶ Interpreting ─▶ Terminal
//!                      │                                   (one remote call,
//!                      └─ config error ─▶ Terminal            never retried)
//! ```
//!
//! The host hands each effect its raw JSON options and the [`Trigger`] that
//! fired it, and receives an [`EffectResult`] back.  Effects never panic or
//! return an error to the host: every failure path ends in an error output.
//!
//! This module provides:
//! - [`Effect`]: object-safe trait implemented by every effect
//! - [`RunPromptEffect`], [`ModerateTextEffect`], [`TextToSpeechEffect`]
//! - [`ModerationCheckVariable`]: the `openaiModerationCheck` replace variable
//! - [`EffectRegistry`]: lookup by effect id for the host bridge
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use openai_effects::config::AppConfig;
//! use openai_effects::effects::{Effect, ModerateTextEffect};
//! use openai_effects::host::Trigger;
//! use openai_effects::openai::OpenAiClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap_or_default();
//!     let client = Arc::new(OpenAiClient::new(config.openai.clone(), Arc::new(config)));
//!
//!     let effect = ModerateTextEffect::new(client);
//!     let result = effect
//!         .trigger(json!({ "text": "hello there" }), &Trigger::from_user("viewer"))
//!         .await;
//!     println!("flagged = {:?}", result.outputs.get_bool("moderationFlagged"));
//! }
//! ```

pub mod moderate_text;
pub mod moderation_check;
pub mod registry;
pub mod run_prompt;
pub mod state;
pub mod text_to_speech;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::host::{EffectResult, Trigger};

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use moderate_text::{
    evaluate_moderation, ModerateTextConfig, ModerateTextEffect, ModerationVerdict,
};
pub use moderation_check::{ModerationCheckVariable, VariableDefinition};
pub use registry::{Catalog, EffectRegistry, RegistryError};
pub use run_prompt::{InputMode, RunPromptConfig, RunPromptEffect};
pub use state::{InvocationState, InvocationTrace};
pub use text_to_speech::{TextToSpeechConfig, TextToSpeechEffect};

// ---------------------------------------------------------------------------
// EffectDefinition
// ---------------------------------------------------------------------------

/// A named output an effect publishes for downstream effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputDefinition {
    /// Output name as seen by the host, e.g. `openaiResponse`.
    #[serde(rename = "defaultName")]
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// Static description of an effect, published to the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub categories: &'static [&'static str],
    pub outputs: &'static [OutputDefinition],
}

impl EffectDefinition {
    /// Returns `true` if this effect publishes an output called `name`.
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o.name == name)
    }
}

// ---------------------------------------------------------------------------
// Effect trait
// ---------------------------------------------------------------------------

/// An effect the host can validate and trigger.
///
/// Options arrive as the host's raw JSON; implementations deserialise them
/// into their own typed configuration.  Options that fail to deserialise are
/// reported as configuration errors, never as panics.
#[async_trait]
pub trait Effect: Send + Sync {
    fn definition(&self) -> &'static EffectDefinition;

    /// Human-readable validation errors; empty means the options are valid.
    fn validate(&self, options: &Value) -> Vec<String>;

    /// Label shown for this effect instance in the host's effect list.
    fn default_label(&self, options: &Value) -> String;

    /// Run the effect once.
    async fn trigger(&self, options: Value, trigger: &Trigger) -> EffectResult;
}

/// Deserialise effect options, mapping failures to a readable message.
pub(crate) fn parse_options<T: DeserializeOwned>(options: Value) -> Result<T, String> {
    serde_json::from_value(options).map_err(|e| format!("Invalid effect options: {e}"))
}

/// Trimmed `value`, or `None` when it is missing or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
