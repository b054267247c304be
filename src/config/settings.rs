//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::host::CredentialStore;

/// Environment variable consulted when `openai.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// ---------------------------------------------------------------------------
// OpenAiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the OpenAI API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key; `None` (or empty) means every call fails with
    /// "OpenAI API key not configured".
    pub api_key: Option<String>,
    /// Base URL, without the `/v1/...` path.
    pub base_url: String,
    /// Transport timeout per request in seconds; `0` disables it.
    pub timeout_secs: u64,
    /// Model used by prompt effects that do not name one.
    pub default_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".into(),
            timeout_secs: 60,
            default_model: "gpt-4o-mini".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the bundled TTS spool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Where synthesised mp3 files are written before playback.  `None` uses
    /// [`AppPaths::tts_spool_dir`].
    pub spool_dir: Option<PathBuf>,
}

impl TtsConfig {
    pub fn resolved_spool_dir(&self) -> PathBuf {
        self.spool_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().tts_spool_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use openai_effects::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub tts: TtsConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`,
    /// then fill an unset API key from `OPENAI_API_KEY`.
    ///
    /// Returns defaults when the file does not exist yet.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppPaths::new().settings_file)?;
        config.apply_env_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Use `env_key` only when the file left the key unset or blank.
    fn apply_env_key(&mut self, env_key: Option<String>) {
        let unset = self
            .openai
            .api_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty());
        if unset {
            if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
                self.openai.api_key = Some(key);
            }
        }
    }
}

impl CredentialStore for AppConfig {
    fn api_key(&self) -> Option<String> {
        self.openai.api_key.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut original = AppConfig::default();
        original.openai.api_key = Some("sk-test".into());
        original.openai.base_url = "http://localhost:8080".into();
        original.openai.timeout_secs = 5;
        original.tts.spool_dir = Some(dir.path().join("spool"));
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(loaded.openai.base_url, "http://localhost:8080");
        assert_eq!(loaded.openai.timeout_secs, 5);
        assert_eq!(loaded.openai.default_model, original.openai.default_model);
        assert_eq!(loaded.tts.spool_dir, original.tts.spool_dir);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.openai.base_url, "https://api.openai.com");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[openai]\napi_key = \"sk-partial\"\n").unwrap();

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-partial"));
        assert_eq!(config.openai.timeout_secs, 60);
        assert_eq!(config.openai.default_model, "gpt-4o-mini");
        assert!(config.tts.spool_dir.is_none());
    }

    #[test]
    fn env_key_fills_only_unset_key() {
        let mut config = AppConfig::default();
        config.apply_env_key(Some("sk-env".into()));
        assert_eq!(config.api_key().as_deref(), Some("sk-env"));

        let mut configured = AppConfig::default();
        configured.openai.api_key = Some("sk-file".into());
        configured.apply_env_key(Some("sk-env".into()));
        assert_eq!(configured.api_key().as_deref(), Some("sk-file"));

        let mut blank_env = AppConfig::default();
        blank_env.apply_env_key(Some("  ".into()));
        assert!(blank_env.api_key().is_none());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.openai.timeout_secs, 60);
        assert_eq!(cfg.openai.default_model, "gpt-4o-mini");
        assert!(cfg
            .tts
            .resolved_spool_dir()
            .ends_with("firebot-openai-tts"));
    }
}
