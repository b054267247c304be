//! Host services injected into effects: chat alerts, audio playback and the
//! credential store.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Chat alerts
// ---------------------------------------------------------------------------

/// Event tag the host's chat feed uses for alert entries.
pub const CHAT_ALERT_EVENT: &str = "ChatAlert";

pub const CHAT_ALERT_ICON: &str = "fad fa-exclamation-triangle";

/// An alert line for the host's chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAlert {
    pub event: String,
    pub message: String,
    pub icon: String,
    /// Freshly generated for every alert.
    pub id: String,
}

impl ChatAlert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            event: CHAT_ALERT_EVENT.to_string(),
            message: message.into(),
            icon: CHAT_ALERT_ICON.to_string(),
            id: Uuid::new_v4().to_string(),
        }
    }
}

/// Fire-and-forget delivery of [`ChatAlert`]s.
#[async_trait]
pub trait ChatAlertSink: Send + Sync {
    async fn send_alert(&self, alert: ChatAlert);
}

/// Discards every alert.
pub struct NoopChatAlerts;

#[async_trait]
impl ChatAlertSink for NoopChatAlerts {
    async fn send_alert(&self, alert: ChatAlert) {
        log::debug!("chat alert dropped (no sink): {}", alert.message);
    }
}

// ---------------------------------------------------------------------------
// Audio playback
// ---------------------------------------------------------------------------

/// Synthesised audio plus the playback options chosen on the effect.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Encoded audio (mp3).
    pub data: Vec<u8>,
    /// Host volume scale, 1 to 10.
    pub volume: f64,
    /// Host-specific output device descriptor, passed through untouched.
    pub output_device: Option<Value>,
    /// Overlay instance name when the device routes to an overlay.
    pub overlay_instance: Option<String>,
    /// Block until playback has finished.
    pub wait_for_completion: bool,
}

/// Plays synthesised audio on the host's side.
#[async_trait]
pub trait AudioPlayback: Send + Sync {
    async fn play(&self, clip: AudioClip) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Source of the OpenAI API key.
///
/// `None` or an empty string means "not configured".
pub trait CredentialStore: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

/// An API key the host may replace when its settings change.
#[derive(Debug, Default)]
pub struct SharedCredentials {
    api_key: RwLock<Option<String>>,
}

impl SharedCredentials {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: RwLock::new(api_key),
        }
    }

    pub fn set(&self, api_key: Option<String>) {
        match self.api_key.write() {
            Ok(mut guard) => *guard = api_key,
            Err(poisoned) => *poisoned.into_inner() = api_key,
        }
    }
}

impl CredentialStore for SharedCredentials {
    fn api_key(&self) -> Option<String> {
        match self.api_key.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_alerts_get_unique_ids() {
        let a = ChatAlert::new("one");
        let b = ChatAlert::new("one");
        assert_ne!(a.id, b.id);
        assert_eq!(a.event, CHAT_ALERT_EVENT);
        assert_eq!(a.icon, CHAT_ALERT_ICON);
    }

    #[test]
    fn shared_credentials_can_be_replaced() {
        let creds = SharedCredentials::new(None);
        assert_eq!(creds.api_key(), None);
        creds.set(Some("sk-test".into()));
        assert_eq!(creds.api_key().as_deref(), Some("sk-test"));
    }
}
