mod ddl;
mod sqlite;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

pub use ddl::parse;
pub use sqlite::introspect_sqlite;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableInfo>,
    pub enums: Vec<EnumInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    pub nullable: bool,
    pub is_primary_key: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumInfo {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship<'a> {
    pub from_table: &'a str,
    pub from_column: &'a str,
    pub to_table: &'a str,
    pub to_column: &'a str,
}

impl SchemaDescription {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|table| table.name == name)
    }

    #[must_use]
    pub fn relationships(&self) -> Vec<Relationship<'_>> {
        self.tables
            .iter()
            .flat_map(|table| {
                table.columns.iter().filter_map(move |column| {
                    column.foreign_key.as_ref().map(|foreign_key| Relationship {
                        from_table: &table.name,
                        from_column: &column.name,
                        to_table: &foreign_key.table,
                        to_column: &foreign_key.column,
                    })
                })
            })
            .collect()
    }
}

impl TableInfo {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|column| column.name == name)
    }
}

#[must_use]
pub fn render(schema: &SchemaDescription) -> String {
    let mut output = String::from("## Database Schema\n\n");

    if !schema.enums.is_empty() {
        output.push_str("### Enums\n");
        for enum_info in &schema.enums {
            let values = enum_info
                .values
                .iter()
                .map(|value| format!("'{value}'"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "- **{}**: {values}", enum_info.name);
        }
        output.push('\n');
    }

    output.push_str("### Tables\n\n");
    for table in &schema.tables {
        let _ = writeln!(output, "#### {}", table.name);
        output.push_str("| Column | Type | Nullable | Notes |\n");
        output.push_str("|--------|------|----------|-------|\n");
        for column in &table.columns {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                column.name,
                column.data_type,
                if column.nullable { "yes" } else { "no" },
                column_notes(column)
            );
        }
        output.push('\n');
    }

    let relationships = schema.relationships();
    if !relationships.is_empty() {
        output.push_str("### Relationships\n");
        for relationship in relationships {
            let _ = writeln!(
                output,
                "- {}.{} → {}.{}",
                relationship.from_table,
                relationship.from_column,
                relationship.to_table,
                relationship.to_column
            );
        }
        output.push('\n');
    }

    output
}

fn column_notes(column: &ColumnInfo) -> String {
    let mut notes = Vec::new();
    if column.is_primary_key {
        notes.push("PK".to_string());
    }
    if let Some(foreign_key) = &column.foreign_key {
        notes.push(format!("FK → {}.{}", foreign_key.table, foreign_key.column));
    }
    if let Some(default_value) = &column.default_value {
        notes.push(format!("default: {default_value}"));
    }
    notes.join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to introspect sqlite database {}: {source}", path.display())]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    DdlFile(PathBuf),
    DdlText(String),
    Sqlite(PathBuf),
}

impl SchemaSource {
    pub fn load(&self) -> Result<SchemaDescription, SchemaError> {
        match self {
            Self::DdlFile(path) => {
                let ddl = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok(parse(&ddl))
            }
            Self::DdlText(ddl) => Ok(parse(ddl)),
            Self::Sqlite(path) => introspect_sqlite(path).map_err(|source| SchemaError::Sqlite {
                path: path.clone(),
                source,
            }),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::DdlFile(path) => format!("ddl:{}", path.display()),
            Self::DdlText(_) => "ddl:inline".to_string(),
            Self::Sqlite(path) => format!("sqlite:{}", path.display()),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::DdlFile(path) | Self::Sqlite(path) => Some(path),
            Self::DdlText(_) => None,
        }
    }
}

// Lazily rendered schema prompt text. Nothing but `invalidate`
// clears a rendered value once it is stored.
#[derive(Debug)]
pub struct SchemaCache {
    source: SchemaSource,
    rendered: RwLock<Option<Arc<str>>>,
}

impl SchemaCache {
    #[must_use]
    pub fn new(source: SchemaSource) -> Self {
        Self {
            source,
            rendered: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    pub fn get(&self) -> Result<Arc<str>, SchemaError> {
        let cached = self.read_slot().clone();
        if let Some(rendered) = cached {
            return Ok(rendered);
        }

        let description = self.source.load()?;
        let rendered: Arc<str> = Arc::from(render(&description));
        tracing::debug!(
            source = %self.source.label(),
            tables = description.tables.len(),
            enums = description.enums.len(),
            "schema prompt rendered"
        );
        *self.write_slot() = Some(Arc::clone(&rendered));
        Ok(rendered)
    }

    pub fn describe(&self) -> Result<SchemaDescription, SchemaError> {
        self.source.load()
    }

    pub fn invalidate(&self) {
        *self.write_slot() = None;
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.read_slot().is_some()
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Arc<str>>> {
        self.rendered.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<str>>> {
        self.rendered.write().unwrap_or_else(PoisonError::into_inner)
    }
}
