use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Value, json};

use super::{ExecutorError, SqlExecutor};
use crate::models::Row;

#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    path: PathBuf,
}

impl SqliteExecutor {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, ExecutorError> {
        let path = self.path.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let connection = open_read_only(&path)?;
            query_rows(&connection, &sql)
        })
        .await
        .map_err(|error| ExecutorError::Query(format!("sqlite worker failed: {error}")))?
    }
}

fn open_read_only(path: &Path) -> Result<Connection, ExecutorError> {
    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|error| {
        ExecutorError::Connection(format!("failed to open {}: {error}", path.display()))
    })?;
    connection
        .pragma_update(None, "query_only", true)
        .map_err(|error| ExecutorError::Connection(error.to_string()))?;
    Ok(connection)
}

pub(crate) fn query_rows(connection: &Connection, sql: &str) -> Result<Vec<Row>, ExecutorError> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|error| ExecutorError::Query(error.to_string()))?;
    let column_names = statement
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = statement
        .query([])
        .map_err(|error| ExecutorError::Query(error.to_string()))?;
    let mut records = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|error| ExecutorError::Query(error.to_string()))?
    {
        let mut record = Row::new();
        for (index, column_name) in column_names.iter().enumerate() {
            let value = row
                .get::<usize, SqlValue>(index)
                .map_err(|error| ExecutorError::Decode(error.to_string()))?;
            record.insert(column_name.clone(), json_value_from_sql(value));
        }
        records.push(record);
    }

    Ok(records)
}

fn json_value_from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => json!(value),
        SqlValue::Real(value) => json!(value),
        SqlValue::Text(value) => json!(value),
        SqlValue::Blob(value) => json!(encode_blob_hex(&value)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}
