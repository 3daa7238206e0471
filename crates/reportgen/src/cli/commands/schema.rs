use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{emit, runtime_failure};
use crate::config::AppConfig;
use crate::models::CommandEnvelope;
use crate::schema::{SchemaCache, render};

const COMMAND: &str = "schema";

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &SchemaArgs, config: &AppConfig) -> Result<()> {
    let cache = SchemaCache::new(config.schema_source());
    let description = cache.describe().map_err(|error| {
        runtime_failure(COMMAND, "schema_unavailable", "unable to load database schema", error)
    })?;

    if !args.json {
        print!("{}", render(&description));
        return Ok(());
    }

    let envelope = CommandEnvelope::ok(COMMAND, json!(description))
        .with_meta("source", json!(cache.source().label()))
        .with_meta("table_count", json!(description.tables.len()))
        .with_meta("enum_count", json!(description.enums.len()));
    emit(&envelope)
}
