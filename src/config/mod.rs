//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the OpenAI
//! client and the TTS spool, `AppPaths` for cross-platform directories, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, OpenAiConfig, TtsConfig, API_KEY_ENV};
