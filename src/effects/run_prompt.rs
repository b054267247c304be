//! Run Prompt: execute a stored OpenAI prompt with structured input.
//!
//! The effect wraps the user's input in the guarded request envelope (see
//! [`crate::request`]), runs the prompt once and publishes the marshalled
//! JSON reply as `openaiResponse`.
//!
//! Two input modes share the effect id:
//!
//! | mode       | `user_input` in the envelope         | error output normalised |
//! |------------|--------------------------------------|-------------------------|
//! | `text`     | the trimmed `inputText` string       | yes                     |
//! | `mappings` | object built from the `inputs` list  | no                      |
//!
//! Configurations saved without a `mode` key run in `text` mode when they
//! carry `inputText` and no `inputs`, and in `mappings` mode otherwise.
//!
//! The difference in error normalisation between the modes is existing
//! behaviour that downstream effects may rely on.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{
    ChatAlert, ChatAlertSink, EffectOutputs, EffectResult, ExecutionDirective, Trigger,
};
use crate::openai::{call_prompt, OpenAiApi, PromptRequest};
use crate::request::{
    validate_mappings, InputMapping, MaxLength, MaxLengthSetting, StructuredRequest, UserInput,
};
use crate::sanitize::{clean_string, normalize_response_payload, NormalizationOptions};

use super::state::{InvocationState, InvocationTrace};
use super::{non_blank, parse_options, Effect, EffectDefinition, OutputDefinition};

pub const EFFECT_ID: &str = "openai:runPrompt";

pub const OUTPUT_ERROR: &str = "openaiError";
pub const OUTPUT_RESPONSE: &str = "openaiResponse";

/// Error used when the provider answered with neither an error nor a body.
pub const NO_RESPONSE_ERROR: &str = "No response returned from OpenAI";

static OUTPUTS: [OutputDefinition; 2] = [
    OutputDefinition {
        name: OUTPUT_ERROR,
        label: "OpenAI Error",
        description: "Error message if the request failed, otherwise empty",
    },
    OutputDefinition {
        name: OUTPUT_RESPONSE,
        label: "OpenAI Response",
        description: "The prompt's JSON response as a string",
    },
];

static DEFINITION: EffectDefinition = EffectDefinition {
    id: EFFECT_ID,
    name: "Run OpenAI Prompt",
    description: "Run a stored OpenAI prompt with structured, injection-guarded input",
    icon: "fad fa-brain",
    categories: &["integrations", "advanced"],
    outputs: &OUTPUTS,
};

// ---------------------------------------------------------------------------
// RunPromptConfig
// ---------------------------------------------------------------------------

/// How `user_input` is supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// A single free-text field.
    Text,
    /// A list of key/value [`InputMapping`]s.
    #[default]
    Mappings,
}

/// Effect options as stored by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunPromptConfig {
    /// Free-form note, used as the chat alert label when set.
    pub comment: Option<String>,
    pub prompt_id: String,
    pub prompt_version: Option<String>,
    /// Falls back to the configured default model when unset.
    pub model_id: Option<String>,
    /// Inferred by [`RunPromptConfig::input_mode`] when absent.
    pub mode: Option<InputMode>,
    pub input_text: Option<String>,
    pub inputs: Vec<InputMapping>,
    /// Re-parse each mapping value as JSON, keeping the string on failure.
    pub parse_json_values: bool,
    pub max_length: Option<MaxLengthSetting>,
    #[serde(flatten)]
    pub normalization: NormalizationOptions,
    pub stop_if_request_fails: bool,
    pub stop_if_response_error: bool,
    pub bubble_stop: bool,
    /// Post an alert to chat when the request fails or the response reports
    /// an error.
    pub send_chat_alert: bool,
}

impl RunPromptConfig {
    /// Trimmed comment if set, otherwise the trimmed prompt id.
    pub fn label(&self) -> String {
        non_blank(self.comment.as_deref())
            .unwrap_or_else(|| self.prompt_id.trim())
            .to_string()
    }

    /// The explicit `mode`, or `text` for a configuration that only has
    /// `inputText`.
    pub fn input_mode(&self) -> InputMode {
        match self.mode {
            Some(mode) => mode,
            None if self.input_text.is_some() && self.inputs.is_empty() => InputMode::Text,
            None => InputMode::Mappings,
        }
    }

    fn text(&self) -> &str {
        self.input_text.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What the provider call amounted to, as far as stop directives go.
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Ok,
    RequestFailed,
    /// The reply parsed but carries its own `error` field.
    ResponseError(String),
}

fn response_error(response: &Value) -> Option<String> {
    let error = response.as_object()?.get("error")?;
    Some(match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// RunPromptEffect
// ---------------------------------------------------------------------------

/// Runs a stored prompt through an [`OpenAiApi`].
pub struct RunPromptEffect {
    api: Arc<dyn OpenAiApi>,
    alerts: Arc<dyn ChatAlertSink>,
    default_model: String,
}

impl RunPromptEffect {
    pub fn new(
        api: Arc<dyn OpenAiApi>,
        alerts: Arc<dyn ChatAlertSink>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            api,
            alerts,
            default_model: default_model.into(),
        }
    }

    fn model_for<'a>(&'a self, config: &'a RunPromptConfig) -> &'a str {
        non_blank(config.model_id.as_deref()).unwrap_or_else(|| self.default_model.trim())
    }

    /// Configuration errors for `config`; empty when it can be run.
    pub fn check(&self, config: &RunPromptConfig) -> Vec<String> {
        let mut errors = Vec::new();

        if config.prompt_id.trim().is_empty() {
            errors.push("Prompt ID is required".to_string());
        }
        if self.model_for(config).is_empty() {
            errors.push("Model is required".to_string());
        }
        match config.input_mode() {
            InputMode::Text => {
                if config.text().trim().is_empty() {
                    errors.push("Input Text is required".to_string());
                }
            }
            InputMode::Mappings => {
                if config.inputs.is_empty() {
                    errors.push("At least one input is required".to_string());
                }
                errors.extend(validate_mappings(&config.inputs).iter().map(|e| e.to_string()));
            }
        }
        if let Err(e) = MaxLength::parse(config.max_length.as_ref()) {
            errors.push(e.to_string());
        }

        errors
    }

    /// Run the prompt with typed options.
    pub async fn run(&self, config: &RunPromptConfig, trigger: &Trigger) -> EffectResult {
        let mut trace = InvocationTrace::new(EFFECT_ID);
        let result = match self.execute(config, trigger, &mut trace).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("run_prompt: unexpected failure: {e:#}");
                failure(&e.to_string())
            }
        };
        trace.finish();
        result
    }

    async fn execute(
        &self,
        config: &RunPromptConfig,
        trigger: &Trigger,
        trace: &mut InvocationTrace,
    ) -> anyhow::Result<EffectResult> {
        // ── 1. Validate ─────────────────────────────────────────────────
        let errors = self.check(config);
        if !errors.is_empty() {
            let message = errors.join("; ");
            log::debug!("run_prompt: configuration error: {message}");
            return Ok(failure(&message));
        }

        // ── 2. Build the envelope ───────────────────────────────────────
        trace.advance(InvocationState::BuildingRequest);
        let max_length = MaxLength::parse(config.max_length.as_ref())?;
        let user_input = match config.input_mode() {
            InputMode::Text => UserInput::from_text(config.text()),
            InputMode::Mappings => {
                UserInput::from_mappings(&config.inputs, config.parse_json_values)
            }
        };
        let body = match StructuredRequest::new(user_input, trigger.username()).to_body(max_length)
        {
            Ok(body) => body,
            Err(e) => {
                log::debug!("run_prompt: {e}");
                return Ok(failure(&e.to_string()));
            }
        };

        let prompt_id = config.prompt_id.trim();
        log::debug!(
            "run_prompt: prompt {prompt_id}, version {}, {} byte input",
            non_blank(config.prompt_version.as_deref()).unwrap_or("unspecified"),
            body.len()
        );
        let request = PromptRequest::new(
            prompt_id,
            config.prompt_version.as_deref(),
            body,
            self.model_for(config),
        );

        // ── 3. Invoke ───────────────────────────────────────────────────
        trace.advance(InvocationState::Invoking);
        let result = call_prompt::<Value>(self.api.as_ref(), &request).await;

        // ── 4. Interpret ────────────────────────────────────────────────
        trace.advance(InvocationState::Interpreting);
        let (error, response) = match (result.error, result.response) {
            (error, _) if !error.is_empty() => (error, None),
            (_, Some(response)) => (String::new(), Some(response)),
            (_, None) => (NO_RESPONSE_ERROR.to_string(), None),
        };

        let outcome = match &response {
            None => {
                log::error!("run_prompt: request failed: {error}");
                Outcome::RequestFailed
            }
            Some(value) => match response_error(value) {
                Some(detail) => {
                    log::warn!("run_prompt: response reported an error: {detail}");
                    Outcome::ResponseError(detail)
                }
                None => {
                    log::debug!("run_prompt: response {value}");
                    Outcome::Ok
                }
            },
        };

        let should_stop = match outcome {
            Outcome::Ok => false,
            Outcome::RequestFailed => config.stop_if_request_fails,
            Outcome::ResponseError(_) => config.stop_if_response_error,
        };
        let execution = ExecutionDirective::stop_if(should_stop, config.bubble_stop);

        if config.send_chat_alert {
            let label = config.label();
            let message = match &outcome {
                Outcome::Ok => None,
                Outcome::RequestFailed => {
                    Some(format!("OpenAI prompt \"{label}\" failed: {error}"))
                }
                Outcome::ResponseError(detail) => Some(format!(
                    "OpenAI prompt \"{label}\" returned an error: {detail}"
                )),
            };
            if let Some(message) = message {
                self.alerts.send_alert(ChatAlert::new(message)).await;
            }
        }

        let options = &config.normalization;
        let normalize = options.any_enabled();
        let error = match config.input_mode() {
            InputMode::Text if normalize => clean_string(&error, options),
            _ => error,
        };
        let response = match response {
            Some(value) if normalize => Some(normalize_response_payload(&value, options)),
            other => other,
        };
        let response = match response {
            Some(value) => serde_json::to_string(&value)?,
            None => String::new(),
        };

        Ok(EffectResult::succeeded(outputs(&error, &response)).with_execution(execution))
    }
}

fn outputs(error: &str, response: &str) -> EffectOutputs {
    EffectOutputs::new()
        .with(OUTPUT_ERROR, error)
        .with(OUTPUT_RESPONSE, response)
}

fn failure(message: &str) -> EffectResult {
    EffectResult::failed(outputs(message, ""))
}

#[async_trait]
impl Effect for RunPromptEffect {
    fn definition(&self) -> &'static EffectDefinition {
        &DEFINITION
    }

    fn validate(&self, options: &Value) -> Vec<String> {
        match parse_options::<RunPromptConfig>(options.clone()) {
            Ok(config) => self.check(&config),
            Err(e) => vec![e],
        }
    }

    fn default_label(&self, options: &Value) -> String {
        parse_options::<RunPromptConfig>(options.clone())
            .map(|config| config.label())
            .unwrap_or_default()
    }

    async fn trigger(&self, options: Value, trigger: &Trigger) -> EffectResult {
        match parse_options::<RunPromptConfig>(options) {
            Ok(config) => self.run(&config, trigger).await,
            Err(e) => {
                log::debug!("run_prompt: {e}");
                failure(&e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
