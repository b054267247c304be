//! Text to Speech: synthesise speech and hand the audio to the host's player.
//!
//! TTS failures never stop the effect chain; they are reported through the
//! `ttsError` output with `success = false`.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{AudioClip, AudioPlayback, EffectOutputs, EffectResult, Trigger};
use crate::openai::{OpenAiApi, SpeechRequest};

use super::state::{InvocationState, InvocationTrace};
use super::{non_blank, parse_options, Effect, EffectDefinition, OutputDefinition};

pub const EFFECT_ID: &str = "openai:textToSpeech";

pub const OUTPUT_ERROR: &str = "ttsError";

pub const DEFAULT_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "alloy";
pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_VOLUME: f64 = 5.0;

pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

pub const NO_AUDIO_ERROR: &str = "Failed to synthesize speech: no audio data returned";

static OUTPUTS: [OutputDefinition; 1] = [OutputDefinition {
    name: OUTPUT_ERROR,
    label: "TTS Error",
    description: "Error message if speech synthesis or playback failed, otherwise empty",
}];

static DEFINITION: EffectDefinition = EffectDefinition {
    id: EFFECT_ID,
    name: "Text to Speech (OpenAI)",
    description: "Speak text aloud using OpenAI text-to-speech",
    icon: "fad fa-microphone-alt",
    categories: &["fun", "integrations"],
    outputs: &OUTPUTS,
};

// ---------------------------------------------------------------------------
// TextToSpeechConfig
// ---------------------------------------------------------------------------

fn default_model() -> Option<String> {
    Some(DEFAULT_MODEL.to_string())
}

fn default_voice() -> Option<String> {
    Some(DEFAULT_VOICE.to_string())
}

/// Effect options as stored by the host.
///
/// An absent `model` or `voice` key takes the default; an explicit `null` or
/// blank value fails validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextToSpeechConfig {
    #[serde(default = "default_model")]
    pub model: Option<String>,
    #[serde(default = "default_voice")]
    pub voice: Option<String>,
    /// Style instructions; only sent for `gpt-4o-mini-tts`.
    pub prompt: Option<String>,
    pub text: String,
    pub speed: Option<f64>,
    /// Host volume scale, 1 to 10.
    pub volume: Option<f64>,
    /// Host output device descriptor, passed through untouched.
    pub audio_output_device: Option<Value>,
    pub overlay_instance: Option<String>,
    pub wait_for_sound: Option<bool>,
}

impl Default for TextToSpeechConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            voice: default_voice(),
            prompt: None,
            text: String::new(),
            speed: None,
            volume: None,
            audio_output_device: None,
            overlay_instance: None,
            wait_for_sound: None,
        }
    }
}

impl TextToSpeechConfig {
    pub fn model(&self) -> &str {
        non_blank(self.model.as_deref()).unwrap_or(DEFAULT_MODEL)
    }

    pub fn voice(&self) -> &str {
        non_blank(self.voice.as_deref()).unwrap_or(DEFAULT_VOICE)
    }

    pub fn speed(&self) -> f64 {
        self.speed.unwrap_or(DEFAULT_SPEED)
    }

    /// `TTS [voice]: <first 30 characters>`.
    pub fn label(&self) -> String {
        let preview: String = self.text.chars().take(30).collect();
        let preview = if preview.is_empty() {
            "Text to speech".to_string()
        } else {
            preview
        };
        format!("TTS [{}]: {preview}", self.voice())
    }
}

// ---------------------------------------------------------------------------
// TextToSpeechEffect
// ---------------------------------------------------------------------------

pub struct TextToSpeechEffect {
    api: Arc<dyn OpenAiApi>,
    playback: Arc<dyn AudioPlayback>,
}

impl TextToSpeechEffect {
    pub fn new(api: Arc<dyn OpenAiApi>, playback: Arc<dyn AudioPlayback>) -> Self {
        Self { api, playback }
    }

    pub fn check(&self, config: &TextToSpeechConfig) -> Vec<String> {
        let mut errors = Vec::new();
        if non_blank(config.model.as_deref()).is_none() {
            errors.push("Please select a valid TTS model.".to_string());
        }
        if non_blank(config.voice.as_deref()).is_none() {
            errors.push("Please select a valid voice.".to_string());
        }
        if config.text.trim().is_empty() {
            errors.push("Please enter text to speak.".to_string());
        }
        if let Some(speed) = config.speed {
            if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
                errors.push("Playback speed must be between 0.25 and 4.0.".to_string());
            }
        }
        errors
    }

    pub async fn run(&self, config: &TextToSpeechConfig) -> EffectResult {
        let mut trace = InvocationTrace::new(EFFECT_ID);
        let result = match self.execute(config, &mut trace).await {
            Ok(result) => result,
            Err(e) => {
                let message = format!("{e:#}");
                log::error!("text_to_speech: {message}");
                failure(&message)
            }
        };
        trace.finish();
        result
    }

    async fn execute(
        &self,
        config: &TextToSpeechConfig,
        trace: &mut InvocationTrace,
    ) -> anyhow::Result<EffectResult> {
        // ── 1. Validate ─────────────────────────────────────────────────
        let errors = self.check(config);
        if !errors.is_empty() {
            let message = errors.join("; ");
            log::debug!("text_to_speech: configuration error: {message}");
            return Ok(failure(&message));
        }

        // ── 2. Build ────────────────────────────────────────────────────
        trace.advance(InvocationState::BuildingRequest);
        let request = SpeechRequest::new(
            config.model(),
            config.voice(),
            &config.text,
            config.speed(),
            config.prompt.as_deref(),
        );
        log::debug!(
            "text_to_speech: model {} voice {} speed {}",
            request.model,
            request.voice,
            request.speed
        );

        // ── 3. Invoke ───────────────────────────────────────────────────
        trace.advance(InvocationState::Invoking);
        let result = self.api.synthesize_speech(&request).await;

        // ── 4. Interpret ────────────────────────────────────────────────
        trace.advance(InvocationState::Interpreting);
        if result.is_err() {
            log::error!("text_to_speech: synthesis failed: {}", result.error);
            return Ok(failure(&result.error));
        }
        let audio = match result.response {
            Some(audio) if !audio.is_empty() => audio,
            _ => {
                log::error!("text_to_speech: {NO_AUDIO_ERROR}");
                return Ok(failure(NO_AUDIO_ERROR));
            }
        };

        let clip = AudioClip {
            data: audio,
            volume: config.volume.unwrap_or(DEFAULT_VOLUME),
            output_device: config.audio_output_device.clone(),
            overlay_instance: config.overlay_instance.clone(),
            wait_for_completion: config.wait_for_sound.unwrap_or(true),
        };
        log::debug!(
            "text_to_speech: playing {} bytes (wait={})",
            clip.data.len(),
            clip.wait_for_completion
        );
        self.playback
            .play(clip)
            .await
            .context("Failed to play synthesized speech")?;

        Ok(EffectResult::succeeded(
            EffectOutputs::new().with(OUTPUT_ERROR, ""),
        ))
    }
}

fn failure(message: &str) -> EffectResult {
    EffectResult::failed(EffectOutputs::new().with(OUTPUT_ERROR, message))
}

#[async_trait]
impl Effect for TextToSpeechEffect {
    fn definition(&self) -> &'static EffectDefinition {
        &DEFINITION
    }

    fn validate(&self, options: &Value) -> Vec<String> {
        match parse_options::<TextToSpeechConfig>(options.clone()) {
            Ok(config) => self.check(&config),
            Err(e) => vec![e],
        }
    }

    fn default_label(&self, options: &Value) -> String {
        parse_options::<TextToSpeechConfig>(options.clone())
            .unwrap_or_default()
            .label()
    }

    async fn trigger(&self, options: Value, _trigger: &Trigger) -> EffectResult {
        match parse_options::<TextToSpeechConfig>(options) {
            Ok(config) => self.run(&config).await,
            Err(e) => failure(&e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
