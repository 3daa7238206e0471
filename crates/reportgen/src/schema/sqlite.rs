use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use super::{ColumnInfo, ForeignKeyRef, SchemaDescription, TableInfo};

pub fn introspect_sqlite(path: &Path) -> Result<SchemaDescription, rusqlite::Error> {
    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    describe_connection(&connection)
}

pub(crate) fn describe_connection(
    connection: &Connection,
) -> Result<SchemaDescription, rusqlite::Error> {
    let mut statement = connection.prepare(
        "SELECT name
         FROM sqlite_schema
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name ASC",
    )?;
    let table_names = statement
        .query_map([], |row| row.get::<usize, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(table_names.len());
    for name in table_names {
        let columns = load_columns(connection, &name)?;
        tables.push(TableInfo { name, columns });
    }

    Ok(SchemaDescription {
        tables,
        enums: Vec::new(),
    })
}

fn load_columns(connection: &Connection, table: &str) -> Result<Vec<ColumnInfo>, rusqlite::Error> {
    let foreign_keys = load_foreign_keys(connection, table)?;

    let mut statement =
        connection.prepare(&format!("PRAGMA table_info({})", single_quoted(table)))?;
    let rows = statement.query_map([], |row| {
        let declared_type = row.get::<usize, Option<String>>(2)?.unwrap_or_default();
        let not_null = row.get::<usize, i64>(3)? != 0;
        let primary_key_position = row.get::<usize, i64>(5)?;
        Ok((
            row.get::<usize, String>(1)?,
            declared_type,
            not_null,
            row.get::<usize, Option<String>>(4)?,
            primary_key_position > 0,
        ))
    })?;

    let mut columns = Vec::new();
    for row in rows {
        let (name, declared_type, not_null, default_value, is_primary_key) = row?;
        let foreign_key = foreign_keys
            .iter()
            .find(|(from, _)| *from == name)
            .map(|(_, reference)| reference.clone());
        columns.push(ColumnInfo {
            data_type: if declared_type.is_empty() {
                "ANY".to_string()
            } else {
                declared_type
            },
            nullable: !not_null && !is_primary_key,
            is_primary_key,
            foreign_key,
            default_value,
            name,
        });
    }
    Ok(columns)
}

// Rows whose target column is implicit (`REFERENCES t` with no column list) are skipped.
fn load_foreign_keys(
    connection: &Connection,
    table: &str,
) -> Result<Vec<(String, ForeignKeyRef)>, rusqlite::Error> {
    let mut statement =
        connection.prepare(&format!("PRAGMA foreign_key_list({})", single_quoted(table)))?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<usize, String>(2)?,
            row.get::<usize, String>(3)?,
            row.get::<usize, Option<String>>(4)?,
        ))
    })?;

    let mut foreign_keys = Vec::new();
    for row in rows {
        let (target_table, from, to) = row?;
        if let Some(to) = to {
            foreign_keys.push((
                from,
                ForeignKeyRef {
                    table: target_table,
                    column: to,
                },
            ));
        }
    }
    Ok(foreign_keys)
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
