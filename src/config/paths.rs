//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\openai-effects\
//!   macOS:   ~/Library/Application Support/openai-effects/
//!   Linux:   ~/.config/openai-effects/
//!
//! TTS spool dir (synthesised mp3 files awaiting playback):
//!   <system temp dir>/firebot-openai-tts/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for spooled TTS audio.
    pub tts_spool_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "openai-effects";
    const TTS_SPOOL_NAME: &'static str = "firebot-openai-tts";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard config path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let tts_spool_dir = std::env::temp_dir().join(Self::TTS_SPOOL_NAME);

        Self {
            config_dir,
            settings_file,
            tts_spool_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .tts_spool_dir
            .file_name()
            .is_some_and(|n| n == "firebot-openai-tts"));
    }
}
