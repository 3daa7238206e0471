use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, Row as _};

use super::{ExecutorError, SqlExecutor};
use crate::models::Row;

#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    database_url: String,
}

impl PostgresExecutor {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

pub(crate) fn read_only_options(database_url: &str) -> Result<PgConnectOptions, ExecutorError> {
    let options = PgConnectOptions::from_str(database_url)
        .map_err(|error| ExecutorError::Connection(error.to_string()))?;
    Ok(options.options([("default_transaction_read_only", "on")]))
}

#[must_use]
pub fn row_json_sql(sql: &str) -> String {
    let body = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT row_to_json(t)::text FROM ({body}) AS t")
}

pub(crate) fn decode_row(encoded: &str) -> Result<Row, ExecutorError> {
    serde_json::from_str::<Row>(encoded).map_err(|error| ExecutorError::Decode(error.to_string()))
}

#[async_trait]
impl SqlExecutor for PostgresExecutor {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, ExecutorError> {
        let options = read_only_options(&self.database_url)?;
        let mut connection = PgConnection::connect_with(&options)
            .await
            .map_err(|error| ExecutorError::Connection(error.to_string()))?;

        let wrapped = row_json_sql(sql);
        let fetched = sqlx::query(&wrapped).fetch_all(&mut connection).await;

        if let Err(error) = connection.close().await {
            tracing::warn!(%error, "failed to close postgres connection");
        }

        fetched
            .map_err(|error| ExecutorError::Query(error.to_string()))?
            .iter()
            .map(|row| {
                let encoded: String = row
                    .try_get(0)
                    .map_err(|error| ExecutorError::Decode(error.to_string()))?;
                decode_row(&encoded)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ExecutorError, decode_row, read_only_options, row_json_sql};

    #[test]
    fn wraps_statement_without_trailing_semicolon() {
        assert_eq!(
            row_json_sql("SELECT 1 AS value ;\n"),
            "SELECT row_to_json(t)::text FROM (SELECT 1 AS value) AS t"
        );
    }

    #[test]
    fn decodes_row_in_column_order() {
        let row = decode_row(r#"{"date":"2024-01-01","value":3}"#).expect("row decodes");
        let keys = row.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["date", "value"]);
        assert_eq!(row["value"], json!(3));
        assert!(decode_row("[]").is_err());
    }

    #[test]
    fn connection_options_parse_the_url() {
        assert!(read_only_options("postgres://reader@localhost:5432/analytics").is_ok());
        assert!(matches!(
            read_only_options("not a connection string"),
            Err(ExecutorError::Connection(_))
        ));
    }
}
