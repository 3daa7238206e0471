pub mod check_sql;
pub mod execute;
pub mod generate;
pub mod modify;
pub mod schema;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Error, Result};
use serde_json::{Value, json};

use crate::models::{CommandEnvelope, CommandEnvelopeFailure, Component};
use crate::validate::validate_components_payload;

pub(crate) fn emit(envelope: &CommandEnvelope) -> Result<()> {
    let encoded =
        serde_json::to_string_pretty(envelope).context("failed to encode command output")?;
    println!("{encoded}");
    Ok(())
}

pub(crate) fn rejected(envelope: CommandEnvelope) -> Error {
    Error::new(CommandEnvelopeFailure::rejected(envelope))
}

pub(crate) fn runtime_failure(
    command: &str,
    code: &str,
    message: &str,
    cause: impl std::fmt::Display,
) -> Error {
    Error::new(CommandEnvelopeFailure::runtime(
        CommandEnvelope::error(command, code, message)
            .with_error_details(json!({ "cause": cause.to_string() })),
    ))
}

pub(crate) fn read_components(command: &str, path: &Path) -> Result<Vec<Component>> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        runtime_failure(
            command,
            "components_unreadable",
            "unable to read components file",
            format!("{}: {error}", path.display()),
        )
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|error| {
        rejected(
            CommandEnvelope::error(command, "components_invalid_json", "components file is not valid JSON")
                .with_error_details(json!({ "cause": error.to_string() })),
        )
    })?;
    let payload = match document {
        Value::Array(components) => json!({ "components": components }),
        other => other,
    };

    validate_components_payload(&payload).map_err(|errors| {
        rejected(
            CommandEnvelope::error(command, "components_invalid", "Invalid components provided")
                .with_error_details(json!(errors.into_issues())),
        )
    })
}
