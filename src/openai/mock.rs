//! Recording test double for [`OpenAiApi`].

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::OpenAiApi;
use super::types::{
    ModerationRequest, ModerationResponse, PromptRequest, ProviderResult, RawProviderMessage,
    SpeechRequest,
};

/// Answers every call with a canned [`ProviderResult`] and records the
/// requests it was given.
pub struct MockOpenAi {
    prompt: ProviderResult<RawProviderMessage>,
    moderation: ProviderResult<ModerationResponse>,
    speech: ProviderResult<Vec<u8>>,
    prompt_calls: Mutex<Vec<PromptRequest>>,
    moderation_calls: Mutex<Vec<ModerationRequest>>,
    speech_calls: Mutex<Vec<SpeechRequest>>,
}

impl MockOpenAi {
    pub fn new() -> Self {
        Self {
            prompt: ProviderResult::err("mock: no prompt reply configured"),
            moderation: ProviderResult::err("mock: no moderation reply configured"),
            speech: ProviderResult::err("mock: no speech reply configured"),
            prompt_calls: Mutex::new(Vec::new()),
            moderation_calls: Mutex::new(Vec::new()),
            speech_calls: Mutex::new(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Canned replies
    // -----------------------------------------------------------------------

    /// Reply to prompts with a single message whose text is `text`.
    pub fn with_prompt_text(mut self, text: &str) -> Self {
        let raw = serde_json::from_value(json!({
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": text }]
            }]
        }))
        .expect("valid provider message");
        self.prompt = ProviderResult::ok(raw);
        self
    }

    /// Reply to prompts with `value` serialised as bare JSON text.
    pub fn with_prompt_json(self, value: Value) -> Self {
        let text = value.to_string();
        self.with_prompt_text(&text)
    }

    pub fn with_prompt_error(mut self, error: &str) -> Self {
        self.prompt = ProviderResult::err(error);
        self
    }

    /// Empty error *and* no response.
    pub fn with_prompt_nothing(mut self) -> Self {
        self.prompt = ProviderResult {
            error: String::new(),
            response: None,
        };
        self
    }

    pub fn with_moderation(mut self, response: Value) -> Self {
        let parsed = serde_json::from_value(response).expect("valid moderation response");
        self.moderation = ProviderResult::ok(parsed);
        self
    }

    pub fn with_moderation_error(mut self, error: &str) -> Self {
        self.moderation = ProviderResult::err(error);
        self
    }

    pub fn with_moderation_nothing(mut self) -> Self {
        self.moderation = ProviderResult {
            error: String::new(),
            response: None,
        };
        self
    }

    pub fn with_speech(mut self, audio: Vec<u8>) -> Self {
        self.speech = ProviderResult::ok(audio);
        self
    }

    pub fn with_speech_error(mut self, error: &str) -> Self {
        self.speech = ProviderResult::err(error);
        self
    }

    // -----------------------------------------------------------------------
    // Recorded calls
    // -----------------------------------------------------------------------

    pub fn prompt_calls(&self) -> Vec<PromptRequest> {
        self.prompt_calls.lock().unwrap().clone()
    }

    pub fn moderation_calls(&self) -> Vec<ModerationRequest> {
        self.moderation_calls.lock().unwrap().clone()
    }

    pub fn speech_calls(&self) -> Vec<SpeechRequest> {
        self.speech_calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.prompt_calls.lock().unwrap().len()
            + self.moderation_calls.lock().unwrap().len()
            + self.speech_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OpenAiApi for MockOpenAi {
    async fn run_prompt(&self, request: &PromptRequest) -> ProviderResult<RawProviderMessage> {
        self.prompt_calls.lock().unwrap().push(request.clone());
        self.prompt.clone()
    }

    async fn moderate_text(
        &self,
        request: &ModerationRequest,
    ) -> ProviderResult<ModerationResponse> {
        self.moderation_calls.lock().unwrap().push(request.clone());
        self.moderation.clone()
    }

    async fn synthesize_speech(&self, request: &SpeechRequest) -> ProviderResult<Vec<u8>> {
        self.speech_calls.lock().unwrap().push(request.clone());
        self.speech.clone()
    }
}
