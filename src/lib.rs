//! OpenAI effects for a streaming automation host.
//!
//! * [`sanitize`]: text cleaning for model output.
//! * [`request`]: the injection-guarded request envelope.
//! * [`openai`]: HTTP client, wire types and response marshalling.
//! * [`host`]: types and services shared with the host.
//! * [`effects`]: Run Prompt, Moderate Text, Text to Speech and the
//!   moderation-check variable.
//! * [`bridge`]: line-delimited JSON protocol used by the binary.
//! * [`config`]: persisted settings.

pub mod bridge;
pub mod config;
pub mod effects;
pub mod host;
pub mod openai;
pub mod request;
pub mod sanitize;
