//! Core `OpenAiApi` trait and the reqwest-backed `OpenAiClient`.
//!
//! `OpenAiClient` talks to three endpoints:
//!
//! | Operation           | Endpoint                | Response             |
//! |---------------------|-------------------------|----------------------|
//! | `run_prompt`        | `POST /v1/responses`    | [`RawProviderMessage`] |
//! | `moderate_text`     | `POST /v1/moderations`  | [`ModerationResponse`] |
//! | `synthesize_speech` | `POST /v1/audio/speech` | mp3 bytes            |
//!
//! Every call returns a [`ProviderResult`]; transport, HTTP and credential
//! failures are logged and folded into its `error` string.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::OpenAiConfig;
use crate::host::CredentialStore;
use crate::openai::marshal::{marshal, MarshalError};
use crate::openai::types::{
    ModerationRequest, ModerationResponse, PromptRequest, ProviderResult, RawProviderMessage,
    SpeechRequest,
};

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the OpenAI API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key is available; no request was sent.
    #[error("OpenAI API key not configured")]
    NotConfigured,

    /// The API key cannot be carried in an HTTP header.
    #[error("OpenAI API key contains characters not allowed in a header")]
    InvalidApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the transport timeout.
    #[error("OpenAI request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("{status} {message}")]
    Api { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse OpenAI response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAiApi trait
// ---------------------------------------------------------------------------

/// The three remote operations effects depend on.
///
/// Implementors must never panic or return early with anything but a
/// [`ProviderResult`]; failures belong in its `error` field.
#[async_trait]
pub trait OpenAiApi: Send + Sync {
    async fn run_prompt(&self, request: &PromptRequest) -> ProviderResult<RawProviderMessage>;

    async fn moderate_text(
        &self,
        request: &ModerationRequest,
    ) -> ProviderResult<ModerationResponse>;

    async fn synthesize_speech(&self, request: &SpeechRequest) -> ProviderResult<Vec<u8>>;
}

/// Run a prompt and marshal its reply into `T`.
///
/// Marshalling failures become the result's `error` string, so this never
/// fails past its boundary.  An empty error with no response is passed
/// through for the caller to detect.
pub async fn call_prompt<T: DeserializeOwned>(
    api: &dyn OpenAiApi,
    request: &PromptRequest,
) -> ProviderResult<T> {
    let raw = api.run_prompt(request).await;
    if raw.is_err() {
        return ProviderResult::err(raw.error);
    }
    let Some(message) = raw.response else {
        return ProviderResult {
            error: String::new(),
            response: None,
        };
    };
    match marshal::<T>(&message) {
        Ok(value) => ProviderResult::ok(value),
        Err(err) => {
            log_marshal_failure(&err);
            ProviderResult::err(err.to_string())
        }
    }
}

fn log_marshal_failure(err: &MarshalError) {
    if err.is_malformed_json() {
        log::error!("OpenAI prompt returned malformed JSON: {err}");
    } else {
        log::error!("OpenAI prompt returned no usable message: {err}");
    }
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// reqwest implementation of [`OpenAiApi`].
///
/// The HTTP handle (with the bearer token baked into its default headers) is
/// built on first use and reused afterwards.  Concurrent first calls are
/// serialised by a [`OnceCell`], so exactly one handle is ever built.  While
/// the credential store has no key the cell stays empty and every call fails
/// with [`ClientError::NotConfigured`] without touching the network.
pub struct OpenAiClient {
    config: OpenAiConfig,
    credentials: Arc<dyn CredentialStore>,
    http: OnceCell<reqwest::Client>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            config,
            credentials,
            http: OnceCell::new(),
        }
    }

    /// Returns `true` once the HTTP handle has been built.
    #[cfg(test)]
    fn is_initialized(&self) -> bool {
        self.http.initialized()
    }

    async fn handle(&self) -> Result<&reqwest::Client, ClientError> {
        self.http
            .get_or_try_init(|| async { self.build_http() })
            .await
    }

    fn build_http(&self) -> Result<reqwest::Client, ClientError> {
        let key = self
            .credentials
            .api_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClientError::NotConfigured)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", key.trim()))
            .map_err(|_| ClientError::InvalidApiKey)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if self.config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(self.config.timeout_secs));
        }

        log::debug!("OpenAI client initialised for {}", self.config.base_url);
        Ok(builder.build()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let http = self.handle().await?;
        let response = http.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }
        Ok(response)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.post(path, body)
            .await?
            .json::<R>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// Turn an error status into [`ClientError::Api`], preferring the API's own
/// `{"error": {"message": ...}}` text.
fn api_error(status: reqwest::StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

fn into_result<T>(operation: &str, outcome: Result<T, ClientError>) -> ProviderResult<T> {
    match outcome {
        Ok(response) => ProviderResult::ok(response),
        Err(err) => {
            log::error!("OpenAI {operation} call failed: {err}");
            ProviderResult::err(err.to_string())
        }
    }
}

#[async_trait]
impl OpenAiApi for OpenAiClient {
    async fn run_prompt(&self, request: &PromptRequest) -> ProviderResult<RawProviderMessage> {
        log::debug!(
            "Running prompt {} (version {}) on {}",
            request.prompt.id,
            request.prompt.version.as_deref().unwrap_or("latest"),
            request.model
        );
        into_result("prompt", self.post_json("/v1/responses", request).await)
    }

    async fn moderate_text(
        &self,
        request: &ModerationRequest,
    ) -> ProviderResult<ModerationResponse> {
        log::debug!("Moderating {} chars with {}", request.input.len(), request.model);
        into_result("moderation", self.post_json("/v1/moderations", request).await)
    }

    async fn synthesize_speech(&self, request: &SpeechRequest) -> ProviderResult<Vec<u8>> {
        log::debug!(
            "Synthesizing speech with model: {}, voice: {}",
            request.model,
            request.voice
        );
        let outcome = async {
            let response = self.post("/v1/audio/speech", request).await?;
            let bytes = response.bytes().await?;
            log::debug!("Synthesized speech, buffer size: {} bytes", bytes.len());
            Ok::<_, ClientError>(bytes.to_vec())
        }
        .await;
        into_result("TTS", outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SharedCredentials;
    use crate::openai::mock::MockOpenAi;
    use serde_json::{json, Value};

    fn client_with(key: Option<&str>) -> (OpenAiClient, Arc<SharedCredentials>) {
        let creds = Arc::new(SharedCredentials::new(key.map(str::to_string)));
        let client = OpenAiClient::new(OpenAiConfig::default(), creds.clone());
        (client, creds)
    }

    #[tokio::test]
    async fn missing_key_fails_every_call_without_io() {
        let (client, _) = client_with(None);

        let prompt = client
            .run_prompt(&PromptRequest::new("pmpt_test", Some("1"), "test", "gpt-4o"))
            .await;
        assert_eq!(prompt.error, "OpenAI API key not configured");
        assert!(prompt.response.is_none());

        let moderation = client
            .moderate_text(&ModerationRequest {
                input: "hi".into(),
                model: "omni-moderation-latest".into(),
            })
            .await;
        assert_eq!(moderation.error, "OpenAI API key not configured");

        let speech = client
            .synthesize_speech(&SpeechRequest::new("tts-1", "alloy", "hi", 1.0, None))
            .await;
        assert_eq!(speech.error, "OpenAI API key not configured");

        assert!(!client.is_initialized());
    }

    #[tokio::test]
    async fn blank_key_counts_as_missing() {
        let (client, _) = client_with(Some("   "));
        assert!(matches!(client.handle().await, Err(ClientError::NotConfigured)));
    }

    #[tokio::test]
    async fn handle_is_built_once_key_appears() {
        let (client, creds) = client_with(Some(""));
        assert!(client.handle().await.is_err());

        creds.set(Some("sk-test".into()));
        assert!(client.handle().await.is_ok());
        assert!(client.is_initialized());
    }

    #[tokio::test]
    async fn concurrent_first_use_builds_one_handle() {
        let (client, _) = client_with(Some("sk-test"));
        let client = Arc::new(client);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let client = Arc::clone(&client);
            tasks.push(tokio::spawn(async move {
                client.handle().await.map(|h| h as *const reqwest::Client as usize).unwrap()
            }));
        }
        let mut addresses = Vec::new();
        for task in tasks {
            addresses.push(task.await.unwrap());
        }
        addresses.dedup();
        assert_eq!(addresses.len(), 1);
    }

    #[test]
    fn api_error_prefers_api_message() {
        let err = api_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(err.to_string(), "401 Incorrect API key provided");

        let plain = api_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(plain.to_string(), "502 upstream down");

        let empty = api_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(empty.to_string(), "429 Too Many Requests");
    }

    #[test]
    fn url_joins_without_double_slash() {
        let mut config = OpenAiConfig::default();
        config.base_url = "http://localhost:8080/".into();
        let client = OpenAiClient::new(config, Arc::new(SharedCredentials::default()));
        assert_eq!(client.url("/v1/responses"), "http://localhost:8080/v1/responses");
    }

    // -----------------------------------------------------------------------
    // call_prompt
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn call_prompt_marshals_fenced_reply() {
        let mock = MockOpenAi::new().with_prompt_text("```json\n{\"english_score\":100}\n```");
        let result: ProviderResult<Value> =
            call_prompt(&mock, &PromptRequest::new("pmpt_x", None, "{}", "gpt-4o")).await;
        assert_eq!(result.error, "");
        assert_eq!(result.response, Some(json!({ "english_score": 100 })));
    }

    #[tokio::test]
    async fn call_prompt_reports_marshal_failure_as_error() {
        let mock = MockOpenAi::new().with_prompt_text("definitely not json");
        let result: ProviderResult<Value> =
            call_prompt(&mock, &PromptRequest::new("pmpt_x", None, "{}", "gpt-4o")).await;
        assert!(result.error.contains("Failed to marshal response to expected type"));
        assert!(result.response.is_none());
    }

    #[tokio::test]
    async fn call_prompt_passes_transport_error_through() {
        let mock = MockOpenAi::new().with_prompt_error("Rate limit reached");
        let result: ProviderResult<Value> =
            call_prompt(&mock, &PromptRequest::new("pmpt_x", None, "{}", "gpt-4o")).await;
        assert_eq!(result.error, "Rate limit reached");
    }
}
