pub mod prompt;
pub mod verify;

use std::sync::Arc;

use serde_json::{Value, json};
use time::Date;

use crate::llm::{LanguageModel, ModelCallError, StructuredRequest, ToolSpec};
use crate::models::ReportConfig;
use crate::schema::{SchemaCache, SchemaError};
use crate::utils::time::utc_today;
use crate::validate::{ValidationIssue, validate_report_config};
use prompt::{GENERATION_TOOL, GENERATION_TOOL_DESCRIPTION, build_system_prompt, generation_messages};
pub use verify::{VerificationOutcome, Verifier};

pub const MAX_RETRIES: u32 = 3;
pub const GENERATION_MAX_TOKENS: u32 = 2000;
pub const VERIFICATION_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub config: ReportConfig,
    pub attempts: u32,
    pub verification_feedback: String,
}

impl GeneratedReport {
    #[must_use]
    pub fn response_body(&self) -> Value {
        json!({
            "config": { "components": self.config.components },
            "reportName": self.config.report_name,
            "message": format!("Created report: {}", self.config.report_name),
            "attempts": self.attempts,
            "verified": true,
            "verificationFeedback": self.verification_feedback,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRejection {
    Invalid {
        issues: Vec<ValidationIssue>,
        attempts: u32,
    },
    Unverified {
        feedback: String,
        suggestions: Vec<String>,
        attempts: u32,
    },
}

impl GenerationRejection {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "Generated configuration is invalid after multiple attempts",
            Self::Unverified { .. } => "Generated configuration did not pass quality verification",
        }
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Invalid { attempts, .. } | Self::Unverified { attempts, .. } => *attempts,
        }
    }

    #[must_use]
    pub fn response_body(&self) -> Value {
        match self {
            Self::Invalid { issues, attempts } => json!({
                "error": self.message(),
                "details": issues,
                "attempts": attempts,
            }),
            Self::Unverified {
                feedback,
                suggestions,
                attempts,
            } => json!({
                "error": self.message(),
                "feedback": feedback,
                "suggestions": suggestions,
                "attempts": attempts,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated(GeneratedReport),
    Rejected(GenerationRejection),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("report generation failed after {attempts} attempt(s): {source}")]
    ModelCall {
        attempts: u32,
        #[source]
        source: ModelCallError,
    },
}

pub struct ReportGenerator {
    model: Arc<dyn LanguageModel>,
    verifier: Verifier,
    schema: Arc<SchemaCache>,
}

impl ReportGenerator {
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        verifier_model: Arc<dyn LanguageModel>,
        schema: Arc<SchemaCache>,
    ) -> Self {
        Self {
            model,
            verifier: Verifier::new(verifier_model),
            schema,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerationOutcome, GenerateError> {
        self.generate_with_date(prompt, utc_today()).await
    }

    pub async fn generate_with_date(
        &self,
        prompt: &str,
        today: Date,
    ) -> Result<GenerationOutcome, GenerateError> {
        if prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let schema_text = self.schema.get()?;
        let system = build_system_prompt(&schema_text, today);
        let tool = ToolSpec::for_type::<ReportConfig>(GENERATION_TOOL, GENERATION_TOOL_DESCRIPTION);

        let mut attempt: u32 = 0;
        let mut last_issues: Option<Vec<ValidationIssue>> = None;

        loop {
            let attempt_number = attempt + 1;
            let is_last = attempt_number == MAX_RETRIES;

            let request = StructuredRequest {
                system: system.clone(),
                messages: generation_messages(prompt, last_issues.as_deref()),
                tool: tool.clone(),
                max_tokens: GENERATION_MAX_TOKENS,
            };

            let raw = match self.model.call_structured(request).await {
                Ok(raw) => raw,
                Err(error) => {
                    tracing::warn!(
                        attempt = attempt_number,
                        max_attempts = MAX_RETRIES,
                        %error,
                        "report generation call failed"
                    );
                    if is_last {
                        return Err(GenerateError::ModelCall {
                            attempts: attempt_number,
                            source: error,
                        });
                    }
                    attempt += 1;
                    continue;
                }
            };

            let config = match validate_report_config(&raw) {
                Ok(config) => config,
                Err(errors) => {
                    tracing::warn!(
                        attempt = attempt_number,
                        max_attempts = MAX_RETRIES,
                        issues = errors.issues().len(),
                        "generated configuration failed validation"
                    );
                    if is_last {
                        return Ok(GenerationOutcome::Rejected(GenerationRejection::Invalid {
                            issues: errors.into_issues(),
                            attempts: attempt_number,
                        }));
                    }
                    last_issues = Some(errors.into_issues());
                    attempt += 1;
                    continue;
                }
            };

            let verification = self.verifier.verify(prompt, &config).await;
            if !verification.is_valid {
                tracing::warn!(
                    attempt = attempt_number,
                    max_attempts = MAX_RETRIES,
                    feedback = %verification.feedback,
                    "generated configuration failed verification"
                );
                if is_last {
                    return Ok(GenerationOutcome::Rejected(GenerationRejection::Unverified {
                        feedback: verification.feedback,
                        suggestions: verification.suggestions,
                        attempts: attempt_number,
                    }));
                }
                last_issues = Some(vec![verification.as_issue()]);
                attempt += 1;
                continue;
            }

            tracing::info!(
                attempts = attempt_number,
                report_name = %config.report_name,
                components = config.components.len(),
                "report generated and verified"
            );
            return Ok(GenerationOutcome::Generated(GeneratedReport {
                config,
                attempts: attempt_number,
                verification_feedback: verification.feedback,
            }));
        }
    }
}
