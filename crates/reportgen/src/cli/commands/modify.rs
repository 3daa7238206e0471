use std::path::PathBuf;

use anyhow::{Error, Result};
use clap::Args;
use serde_json::json;

use super::{emit, read_components};
use crate::config::AppConfig;
use crate::models::{CommandEnvelope, CommandEnvelopeFailure};
use crate::modify::{ModificationParser, ModifyError};
use crate::services::language_model;

const COMMAND: &str = "modify";

#[derive(Debug, Clone, Args)]
pub struct ModifyArgs {
    #[arg(value_name = "PROMPT")]
    pub prompt: String,

    #[arg(long, value_name = "FILE")]
    pub components: PathBuf,
}

pub async fn run(args: &ModifyArgs, config: &AppConfig) -> Result<()> {
    let path = config.paths.resolve(&args.components)?;
    let components = read_components(COMMAND, &path)?;
    let parser = ModificationParser::new(language_model(config));

    match parser.parse(&args.prompt, &components).await {
        Ok(resolved) => emit(&CommandEnvelope::ok(COMMAND, json!(resolved))),
        Err(error) => Err(envelope_failure(&error)),
    }
}

fn envelope_failure(error: &ModifyError) -> Error {
    let details = match error {
        ModifyError::InvalidAction { errors, received } => Some(json!({
            "issues": errors.issues(),
            "received": received,
        })),
        ModifyError::ComponentNotFound { available, .. } => {
            Some(json!({ "availableComponents": available }))
        }
        ModifyError::AmbiguousComponent { candidates, .. } => {
            Some(json!({ "candidates": candidates }))
        }
        _ => None,
    };

    let mut envelope = CommandEnvelope::error(COMMAND, error.code(), error.to_string());
    if let Some(details) = details {
        envelope = envelope.with_error_details(details);
    }

    let failure = if error.is_rejection() {
        CommandEnvelopeFailure::rejected(envelope)
    } else {
        CommandEnvelopeFailure::runtime(envelope)
    };
    Error::new(failure)
}
