use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{emit, rejected};
use crate::guard::{sanitize, validate_read_only_sql};
use crate::models::CommandEnvelope;

const COMMAND: &str = "check-sql";

#[derive(Debug, Clone, Args)]
pub struct CheckSqlArgs {
    #[arg(value_name = "SQL")]
    pub sql: String,
}

pub fn run(args: &CheckSqlArgs) -> Result<()> {
    let sanitized = sanitize(&args.sql);
    match validate_read_only_sql(&args.sql) {
        Ok(()) => emit(
            &CommandEnvelope::ok(COMMAND, json!({ "isValid": true, "sanitized": sanitized }))
                .with_meta("guardrail_checked", json!(true)),
        ),
        Err(violation) => Err(rejected(
            CommandEnvelope::error(COMMAND, "sql_guardrail_violation", &violation.message)
                .with_data(json!({
                    "isValid": false,
                    "error": violation.message.clone(),
                    "sanitized": sanitized,
                }))
                .with_meta("guardrail_checked", json!(true))
                .with_error_details(violation.details()),
        )),
    }
}
