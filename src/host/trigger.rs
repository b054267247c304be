//! Trigger metadata supplied by the host with every effect invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The event that caused an effect to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    pub metadata: TriggerMetadata,
}

/// Only `username` is interpreted; everything else the host sends is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trigger {
    /// A trigger fired by `username`.
    pub fn from_user(username: impl Into<String>) -> Self {
        Self {
            metadata: TriggerMetadata {
                username: Some(username.into()),
                extra: Map::new(),
            },
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.metadata.username.as_deref()
    }
}
