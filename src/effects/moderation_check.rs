//! `openaiModerationCheck[text]` replace variable.
//!
//! Evaluates to `"true"` when the text is flagged and `"false"` when it is
//! clean.  Any failure evaluates to `"true"`.

use std::sync::Arc;

use serde::Serialize;

use crate::openai::{OpenAiApi, DEFAULT_MODERATION_MODEL};

use super::moderate_text::evaluate_moderation;

pub const VARIABLE_HANDLE: &str = "openaiModerationCheck";

/// Static description of a replace variable, published to the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub handle: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub possible_data_output: &'static [&'static str],
}

static DEFINITION: VariableDefinition = VariableDefinition {
    handle: VARIABLE_HANDLE,
    description: "Check if text violates OpenAI content policy. Returns \"true\" if flagged, \
                  \"false\" if clean. Fails closed (returns \"true\") on API errors.",
    usage: "openaiModerationCheck[text]",
    possible_data_output: &["text"],
};

/// Moderation check usable inside any host text field.
pub struct ModerationCheckVariable {
    api: Arc<dyn OpenAiApi>,
}

impl ModerationCheckVariable {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    pub fn definition(&self) -> &'static VariableDefinition {
        &DEFINITION
    }

    /// Evaluate against the first argument; a missing argument counts as
    /// blank text.
    pub async fn evaluate(&self, args: &[String]) -> String {
        let text = args.first().map(String::as_str).unwrap_or_default();
        self.is_flagged(text).await.to_string()
    }

    pub async fn is_flagged(&self, text: &str) -> bool {
        let verdict = evaluate_moderation(self.api.as_ref(), text, DEFAULT_MODERATION_MODEL).await;
        verdict.flagged
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::openai::MockOpenAi;

    fn reply(flagged: bool) -> serde_json::Value {
        json!({ "results": [{ "flagged": flagged }] })
    }

    #[tokio::test]
    async fn clean_and_flagged() {
        let clean =
            ModerationCheckVariable::new(Arc::new(MockOpenAi::new().with_moderation(reply(false))));
        assert_eq!(clean.evaluate(&["hello".to_string()]).await, "false");

        let flagged =
            ModerationCheckVariable::new(Arc::new(MockOpenAi::new().with_moderation(reply(true))));
        assert_eq!(flagged.evaluate(&["bad".to_string()]).await, "true");
    }

    #[tokio::test]
    async fn blank_or_missing_text_fails_closed_without_a_call() {
        let mock = Arc::new(MockOpenAi::new().with_moderation(reply(false)));
        let variable = ModerationCheckVariable::new(mock.clone());

        assert_eq!(variable.evaluate(&[]).await, "true");
        assert_eq!(variable.evaluate(&["  ".to_string()]).await, "true");
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn errors_fail_closed() {
        let failing = ModerationCheckVariable::new(Arc::new(
            MockOpenAi::new().with_moderation_error("500 Internal Server Error"),
        ));
        assert!(failing.is_flagged("x").await);

        let empty =
            ModerationCheckVariable::new(Arc::new(MockOpenAi::new().with_moderation_nothing()));
        assert!(empty.is_flagged("x").await);

        let no_results = ModerationCheckVariable::new(Arc::new(
            MockOpenAi::new().with_moderation(json!({ "results": [] })),
        ));
        assert!(no_results.is_flagged("x").await);
    }

    #[tokio::test]
    async fn always_uses_the_omni_model() {
        let mock = Arc::new(MockOpenAi::new().with_moderation(reply(false)));
        ModerationCheckVariable::new(mock.clone()).is_flagged("x").await;
        assert_eq!(mock.moderation_calls()[0].model, "omni-moderation-latest");
    }

    #[test]
    fn definition_serialises_camel_case() {
        let variable = ModerationCheckVariable::new(Arc::new(MockOpenAi::new()));
        let def = serde_json::to_value(variable.definition()).unwrap();
        assert_eq!(def["handle"], "openaiModerationCheck");
        assert_eq!(def["possibleDataOutput"], json!(["text"]));
    }
}
