//! Moderate Text: check text against the OpenAI moderation endpoint.
//!
//! Moderation fails closed.  Blank input, a transport error, a missing reply
//! or a reply without a usable `flagged` value are all reported as
//! `moderationFlagged = true` with a populated `moderationError`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{EffectOutputs, EffectResult, ExecutionDirective, Trigger};
use crate::openai::{ModerationRequest, ModerationResponse, OpenAiApi, DEFAULT_MODERATION_MODEL};

use super::state::{InvocationState, InvocationTrace};
use super::{non_blank, parse_options, Effect, EffectDefinition, OutputDefinition};

pub const EFFECT_ID: &str = "openai:moderateText";

pub const OUTPUT_FLAGGED: &str = "moderationFlagged";
pub const OUTPUT_RESULT: &str = "moderationResult";
pub const OUTPUT_ERROR: &str = "moderationError";

pub const NO_TEXT_ERROR: &str = "No text provided for moderation";
pub const NO_RESPONSE_ERROR: &str = "No response from moderation API";
pub const NO_RESULT_ERROR: &str = "Moderation response contained no usable result";

static OUTPUTS: [OutputDefinition; 3] = [
    OutputDefinition {
        name: OUTPUT_FLAGGED,
        label: "Moderation Flagged",
        description: "true if the text was flagged or moderation could not be completed",
    },
    OutputDefinition {
        name: OUTPUT_RESULT,
        label: "Moderation Result",
        description: "The full moderation response as JSON",
    },
    OutputDefinition {
        name: OUTPUT_ERROR,
        label: "Moderation Error",
        description: "Error message if moderation failed, otherwise empty",
    },
];

static DEFINITION: EffectDefinition = EffectDefinition {
    id: EFFECT_ID,
    name: "Moderate Text (OpenAI)",
    description: "Check text against the OpenAI content policy",
    icon: "fad fa-shield-check",
    categories: &["integrations", "advanced"],
    outputs: &OUTPUTS,
};

// ---------------------------------------------------------------------------
// ModerationVerdict
// ---------------------------------------------------------------------------

/// Outcome of one moderation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationVerdict {
    pub flagged: bool,
    /// The provider reply, when one arrived.
    pub response: Option<ModerationResponse>,
    /// Empty unless the check failed closed.
    pub error: String,
}

impl ModerationVerdict {
    fn fail_closed(error: impl Into<String>, response: Option<ModerationResponse>) -> Self {
        let error = error.into();
        log::warn!("moderation: failing closed: {error}");
        Self {
            flagged: true,
            response,
            error,
        }
    }
}

/// Moderate `text` with `model`, failing closed on every ambiguous outcome.
///
/// Blank text is rejected without calling the provider.
pub async fn evaluate_moderation(
    api: &dyn OpenAiApi,
    text: &str,
    model: &str,
) -> ModerationVerdict {
    if text.trim().is_empty() {
        return ModerationVerdict::fail_closed(NO_TEXT_ERROR, None);
    }

    let request = ModerationRequest {
        input: text.to_string(),
        model: model.to_string(),
    };
    let result = api.moderate_text(&request).await;

    if result.is_err() {
        log::error!("moderation: request failed: {}", result.error);
        return ModerationVerdict::fail_closed(result.error, None);
    }
    let Some(response) = result.response else {
        log::error!("moderation: {NO_RESPONSE_ERROR}");
        return ModerationVerdict::fail_closed(NO_RESPONSE_ERROR, None);
    };

    match response.first_flagged() {
        Some(flagged) => {
            log::debug!("moderation: flagged={flagged}");
            ModerationVerdict {
                flagged,
                response: Some(response),
                error: String::new(),
            }
        }
        None => ModerationVerdict::fail_closed(NO_RESULT_ERROR, Some(response)),
    }
}

// ---------------------------------------------------------------------------
// ModerateTextConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModerateTextConfig {
    pub text: String,
    /// Defaults to `omni-moderation-latest`.
    pub model_id: Option<String>,
    pub stop_if_flagged: bool,
    pub bubble_stop: bool,
}

impl ModerateTextConfig {
    pub fn model(&self) -> &str {
        non_blank(self.model_id.as_deref()).unwrap_or(DEFAULT_MODERATION_MODEL)
    }
}

// ---------------------------------------------------------------------------
// ModerateTextEffect
// ---------------------------------------------------------------------------

pub struct ModerateTextEffect {
    api: Arc<dyn OpenAiApi>,
}

impl ModerateTextEffect {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    pub fn check(&self, config: &ModerateTextConfig) -> Vec<String> {
        if config.text.trim().is_empty() {
            vec!["Text to moderate is required.".to_string()]
        } else {
            Vec::new()
        }
    }

    /// Moderate with typed options.  Always succeeds from the host's point of
    /// view; failures are reported through the outputs.
    pub async fn run(&self, config: &ModerateTextConfig) -> EffectResult {
        let mut trace = InvocationTrace::new(EFFECT_ID);
        let verdict = match self.execute(config, &mut trace).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::error!("moderate_text: unexpected failure: {e:#}");
                ModerationVerdict::fail_closed(e.to_string(), None)
            }
        };
        trace.finish();
        into_result(config, verdict)
    }

    async fn execute(
        &self,
        config: &ModerateTextConfig,
        trace: &mut InvocationTrace,
    ) -> anyhow::Result<ModerationVerdict> {
        if !self.check(config).is_empty() {
            return Ok(ModerationVerdict::fail_closed(NO_TEXT_ERROR, None));
        }

        trace.advance(InvocationState::BuildingRequest);
        let model = config.model();
        log::debug!("moderate_text: model {model}");

        trace.advance(InvocationState::Invoking);
        let verdict = evaluate_moderation(self.api.as_ref(), &config.text, model).await;

        trace.advance(InvocationState::Interpreting);
        Ok(verdict)
    }
}

fn into_result(config: &ModerateTextConfig, verdict: ModerationVerdict) -> EffectResult {
    let result = match &verdict.response {
        Some(response) => serde_json::to_string(response).unwrap_or_else(|e| {
            log::error!("moderate_text: could not serialise response: {e}");
            String::new()
        }),
        None => String::new(),
    };

    let should_stop = config.stop_if_flagged && verdict.flagged;
    if should_stop {
        log::info!("moderate_text: content flagged, stopping effect execution");
    }

    EffectResult::succeeded(
        EffectOutputs::new()
            .with(OUTPUT_FLAGGED, verdict.flagged)
            .with(OUTPUT_RESULT, result)
            .with(OUTPUT_ERROR, verdict.error),
    )
    .with_execution(ExecutionDirective::stop_if(should_stop, config.bubble_stop))
}

#[async_trait]
impl Effect for ModerateTextEffect {
    fn definition(&self) -> &'static EffectDefinition {
        &DEFINITION
    }

    fn validate(&self, options: &Value) -> Vec<String> {
        match parse_options::<ModerateTextConfig>(options.clone()) {
            Ok(config) => self.check(&config),
            Err(e) => vec![e],
        }
    }

    fn default_label(&self, options: &Value) -> String {
        let model = parse_options::<ModerateTextConfig>(options.clone())
            .map(|config| config.model().to_string())
            .unwrap_or_else(|_| DEFAULT_MODERATION_MODEL.to_string());
        format!("Moderate [{model}]")
    }

    async fn trigger(&self, options: Value, _trigger: &Trigger) -> EffectResult {
        match parse_options::<ModerateTextConfig>(options) {
            Ok(config) => self.run(&config).await,
            Err(e) => into_result(
                &ModerateTextConfig::default(),
                ModerationVerdict::fail_closed(e, None),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
