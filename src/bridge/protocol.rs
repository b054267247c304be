//! Wire types of the line-delimited JSON bridge.
//!
//! Every line on stdin is one [`RequestEnvelope`]; every line on stdout is one
//! [`OutgoingLine`], either the response to a request (matched by `id`) or an
//! unsolicited event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{ChatAlert, Trigger};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One request line.  `id` is echoed back verbatim and may be any JSON value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub id: Value,
    #[serde(flatten)]
    pub request: BridgeRequest,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// Run an effect.
    Trigger {
        effect: String,
        #[serde(default)]
        options: Value,
        #[serde(default)]
        trigger: Trigger,
    },
    /// Validate effect options.
    Validate {
        effect: String,
        #[serde(default)]
        options: Value,
    },
    /// Default label for effect options.
    Label {
        effect: String,
        #[serde(default)]
        options: Value,
    },
    /// Evaluate a replace variable.
    Evaluate {
        variable: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Effect/variable definitions and model catalogs.
    Catalog,
}

// ---------------------------------------------------------------------------
// Outgoing lines
// ---------------------------------------------------------------------------

/// Audio the host should play, as written to the spool directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySound {
    pub filepath: String,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_output_device: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_instance: Option<String>,
    pub wait_for_sound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum BridgeEvent {
    ChatAlert(ChatAlert),
    PlaySound(PlaySound),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingLine {
    Response {
        id: Value,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event(BridgeEvent),
}

impl OutgoingLine {
    pub fn ok(id: Value, result: Value) -> Self {
        OutgoingLine::Response {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: impl Into<String>) -> Self {
        OutgoingLine::Response {
            id,
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}
