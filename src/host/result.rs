//! What an effect hands back to the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// ExecutionDirective
// ---------------------------------------------------------------------------

/// Request to halt the current effect chain, optionally propagating the halt
/// to the enclosing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDirective {
    pub stop: bool,
    pub bubble_stop: bool,
}

impl ExecutionDirective {
    /// Stop the chain; `bubble` also stops the parent chain.
    pub fn stop(bubble: bool) -> Self {
        Self {
            stop: true,
            bubble_stop: bubble,
        }
    }

    /// `Some(stop(bubble))` when `should_stop`, otherwise `None`
    /// ("continue unchanged").
    pub fn stop_if(should_stop: bool, bubble: bool) -> Option<Self> {
        should_stop.then(|| Self::stop(bubble))
    }
}

// ---------------------------------------------------------------------------
// EffectOutputs
// ---------------------------------------------------------------------------

/// Named output values made available to downstream effects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectOutputs(Map<String, Value>);

impl EffectOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String output `name`, if present and a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Boolean output `name`, if present and a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EffectResult
// ---------------------------------------------------------------------------

/// Complete answer to one effect invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectResult {
    /// `false` for configuration errors and terminal TTS failures.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionDirective>,
    pub outputs: EffectOutputs,
}

impl EffectResult {
    pub fn succeeded(outputs: EffectOutputs) -> Self {
        Self {
            success: true,
            execution: None,
            outputs,
        }
    }

    pub fn failed(outputs: EffectOutputs) -> Self {
        Self {
            success: false,
            execution: None,
            outputs,
        }
    }

    pub fn with_execution(mut self, execution: Option<ExecutionDirective>) -> Self {
        self.execution = execution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stop_if_only_when_stopping() {
        assert_eq!(ExecutionDirective::stop_if(false, true), None);
        assert_eq!(
            ExecutionDirective::stop_if(true, true),
            Some(ExecutionDirective {
                stop: true,
                bubble_stop: true
            })
        );
    }

    #[test]
    fn result_serialises_for_host() {
        let result = EffectResult::succeeded(
            EffectOutputs::new()
                .with("moderationFlagged", true)
                .with("moderationError", ""),
        )
        .with_execution(Some(ExecutionDirective::stop(false)));

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "execution": { "stop": true, "bubbleStop": false },
                "outputs": { "moderationFlagged": true, "moderationError": "" }
            })
        );
    }

    #[test]
    fn continue_omits_execution() {
        let result = EffectResult::failed(EffectOutputs::new().with("ttsError", "boom"));
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("execution").is_none());
        assert_eq!(result.outputs.get_str("ttsError"), Some("boom"));
    }
}
