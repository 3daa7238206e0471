use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VERIFICATION_MAX_TOKENS;
use super::prompt::{
    VERIFICATION_TOOL, VERIFICATION_TOOL_DESCRIPTION, render_config, verification_message,
    verification_system_prompt,
};
use crate::llm::{ChatMessage, LanguageModel, StructuredRequest, ToolSpec};
use crate::models::ReportConfig;
use crate::validate::ValidationIssue;

pub const SKIPPED_FEEDBACK: &str = "Verification step skipped due to error";
pub const UNPARSED_FEEDBACK: &str = "Verification completed";
const MISSING_FEEDBACK: &str = "No feedback provided";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    /// Whether the configuration answers the user's request
    pub is_valid: bool,

    /// Explanation of issues if invalid, or confirmation if valid
    pub feedback: String,

    /// Specific improvements if needed
    pub suggestions: Vec<String>,
}

impl VerificationOutcome {
    #[must_use]
    pub fn passed(feedback: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            feedback: feedback.into(),
            suggestions: Vec::new(),
        }
    }

    // Reads the verifier's tool input. Missing fields fall back to defaults;
    // a non-object answer counts as a pass.
    #[must_use]
    pub fn from_tool_input(input: &Value) -> Self {
        let Some(object) = input.as_object() else {
            return Self::passed(UNPARSED_FEEDBACK);
        };

        Self {
            is_valid: object
                .get("isValid")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            feedback: object
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or(MISSING_FEEDBACK)
                .to_string(),
            suggestions: object
                .get("suggestions")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn as_issue(&self) -> ValidationIssue {
        ValidationIssue::new(
            "verification",
            format!(
                "Verification failed: {}. Suggestions: {}",
                self.feedback,
                self.suggestions.join(", ")
            ),
        )
    }
}

#[derive(Clone)]
pub struct Verifier {
    model: Arc<dyn LanguageModel>,
}

impl Verifier {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn verify(&self, prompt: &str, config: &ReportConfig) -> VerificationOutcome {
        let config_json = match render_config(config) {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!(%error, "verification skipped: config could not be encoded");
                return VerificationOutcome::passed(SKIPPED_FEEDBACK);
            }
        };

        let request = StructuredRequest {
            system: verification_system_prompt().to_string(),
            messages: vec![ChatMessage::user(verification_message(prompt, &config_json))],
            tool: ToolSpec::for_type::<VerificationOutcome>(
                VERIFICATION_TOOL,
                VERIFICATION_TOOL_DESCRIPTION,
            ),
            max_tokens: VERIFICATION_MAX_TOKENS,
        };

        match self.model.call_structured(request).await {
            Ok(input) => VerificationOutcome::from_tool_input(&input),
            Err(error) => {
                tracing::warn!(%error, "verification call failed; accepting config");
                VerificationOutcome::passed(SKIPPED_FEEDBACK)
            }
        }
    }
}
