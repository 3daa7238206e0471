use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{emit, read_components, runtime_failure};
use crate::config::AppConfig;
use crate::execute::QueryEngine;
use crate::models::{CommandEnvelope, ExecutedComponent};
use crate::services::sql_executor;

const COMMAND: &str = "execute";

#[derive(Debug, Clone, Args)]
pub struct ExecuteArgs {
    #[arg(value_name = "COMPONENTS_JSON_FILE")]
    pub components: PathBuf,
}

pub async fn run(args: &ExecuteArgs, config: &AppConfig) -> Result<()> {
    let path = config.paths.resolve(&args.components)?;
    let components = read_components(COMMAND, &path)?;
    let engine = QueryEngine::new(sql_executor(config));
    let executed = engine.execute_all(components).await;

    let failed = executed
        .iter()
        .filter(|component| component.outcome.is_err())
        .count();
    let encoded = executed
        .iter()
        .map(ExecutedComponent::to_json)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| {
            runtime_failure(
                COMMAND,
                "results_encode_failed",
                "failed to encode component results",
                error,
            )
        })?;

    emit(
        &CommandEnvelope::ok(COMMAND, json!({ "components": encoded }))
            .with_meta("database", json!(config.database.label()))
            .with_meta("component_count", json!(executed.len()))
            .with_meta("failed_count", json!(failed)),
    )
}
