//! Effect lookup by id, plus the catalogs the host's option UI needs.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::host::{AudioPlayback, ChatAlertSink, EffectResult, Trigger};
use crate::openai::{
    OpenAiApi, AVAILABLE_MODELS, AVAILABLE_MODERATION_MODELS, AVAILABLE_TTS_MODELS,
    AVAILABLE_VOICES,
};

use super::moderate_text::ModerateTextEffect;
use super::moderation_check::{ModerationCheckVariable, VariableDefinition};
use super::run_prompt::RunPromptEffect;
use super::text_to_speech::TextToSpeechEffect;
use super::{Effect, EffectDefinition};

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("Unknown replace variable: {0}")]
    UnknownVariable(String),
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Everything the host needs to render effect option forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub effects: Vec<&'static EffectDefinition>,
    pub variables: Vec<&'static VariableDefinition>,
    pub models: &'static [&'static str],
    pub tts_models: &'static [&'static str],
    pub voices: &'static [&'static str],
    pub moderation_models: &'static [&'static str],
}

// ---------------------------------------------------------------------------
// EffectRegistry
// ---------------------------------------------------------------------------

/// Owns one instance of every effect, all sharing the same client.
pub struct EffectRegistry {
    effects: Vec<Arc<dyn Effect>>,
    moderation_check: ModerationCheckVariable,
}

impl EffectRegistry {
    pub fn new(
        api: Arc<dyn OpenAiApi>,
        alerts: Arc<dyn ChatAlertSink>,
        playback: Arc<dyn AudioPlayback>,
        default_model: impl Into<String>,
    ) -> Self {
        let effects: Vec<Arc<dyn Effect>> = vec![
            Arc::new(RunPromptEffect::new(api.clone(), alerts, default_model)),
            Arc::new(ModerateTextEffect::new(api.clone())),
            Arc::new(TextToSpeechEffect::new(api.clone(), playback)),
        ];
        Self {
            effects,
            moderation_check: ModerationCheckVariable::new(api),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Effect>> {
        self.effects.iter().find(|e| e.definition().id == id)
    }

    fn lookup(&self, id: &str) -> Result<&Arc<dyn Effect>, RegistryError> {
        self.get(id)
            .ok_or_else(|| RegistryError::UnknownEffect(id.to_string()))
    }

    pub fn definitions(&self) -> Vec<&'static EffectDefinition> {
        self.effects.iter().map(|e| e.definition()).collect()
    }

    pub fn catalog(&self) -> Catalog {
        Catalog {
            effects: self.definitions(),
            variables: vec![self.moderation_check.definition()],
            models: AVAILABLE_MODELS,
            tts_models: AVAILABLE_TTS_MODELS,
            voices: AVAILABLE_VOICES,
            moderation_models: AVAILABLE_MODERATION_MODELS,
        }
    }

    pub fn validate(&self, id: &str, options: &Value) -> Result<Vec<String>, RegistryError> {
        Ok(self.lookup(id)?.validate(options))
    }

    pub fn default_label(&self, id: &str, options: &Value) -> Result<String, RegistryError> {
        Ok(self.lookup(id)?.default_label(options))
    }

    pub async fn trigger(
        &self,
        id: &str,
        options: Value,
        trigger: &Trigger,
    ) -> Result<EffectResult, RegistryError> {
        let effect = self.lookup(id)?;
        log::info!("registry: triggering {id}");
        Ok(effect.trigger(options, trigger).await)
    }

    /// Evaluate the replace variable `handle` with `args`.
    pub async fn evaluate(&self, handle: &str, args: &[String]) -> Result<String, RegistryError> {
        if handle == self.moderation_check.definition().handle {
            Ok(self.moderation_check.evaluate(args).await)
        } else {
            Err(RegistryError::UnknownVariable(handle.to_string()))
        }
    }
}
