use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{emit, rejected, runtime_failure};
use crate::config::AppConfig;
use crate::generate::{GenerateError, GenerationOutcome};
use crate::models::CommandEnvelope;
use crate::services::Services;

const COMMAND: &str = "generate";

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[arg(value_name = "PROMPT")]
    pub prompt: String,
}

pub async fn run(args: &GenerateArgs, config: &AppConfig) -> Result<()> {
    let services = Services::from_config(config);
    match services.generator.generate(&args.prompt).await {
        Ok(GenerationOutcome::Generated(report)) => emit(
            &CommandEnvelope::ok(COMMAND, report.response_body())
                .with_meta("attempts", json!(report.attempts)),
        ),
        Ok(GenerationOutcome::Rejected(rejection)) => Err(rejected(
            CommandEnvelope::error(COMMAND, "generation_rejected", rejection.message())
                .with_meta("attempts", json!(rejection.attempts()))
                .with_error_details(rejection.response_body()),
        )),
        Err(GenerateError::EmptyPrompt) => Err(rejected(CommandEnvelope::error(
            COMMAND,
            "prompt_required",
            "Prompt is required",
        ))),
        Err(GenerateError::Schema(error)) => Err(runtime_failure(
            COMMAND,
            "schema_unavailable",
            "unable to load database schema",
            error,
        )),
        Err(error @ GenerateError::ModelCall { .. }) => Err(runtime_failure(
            COMMAND,
            "model_call_failed",
            "Failed to generate report",
            error,
        )),
    }
}
