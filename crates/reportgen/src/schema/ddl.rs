use std::sync::OnceLock;

use regex::Regex;

use super::{ColumnInfo, EnumInfo, ForeignKeyRef, SchemaDescription, TableInfo};

const TYPE_TERMINATORS: &str = "PRIMARY|NOT|NULL|DEFAULT|REFERENCES|UNIQUE|CHECK";

#[must_use]
pub fn parse(ddl: &str) -> SchemaDescription {
    let ddl = line_comment_regex().replace_all(ddl, "");
    SchemaDescription {
        tables: parse_tables(&ddl),
        enums: parse_enums(&ddl),
    }
}

fn parse_enums(ddl: &str) -> Vec<EnumInfo> {
    enum_regex()
        .captures_iter(ddl)
        .map(|captures| EnumInfo {
            name: captures[1].to_string(),
            values: captures[2]
                .split(',')
                .map(|value| value.trim().replace('\'', ""))
                .filter(|value| !value.is_empty())
                .collect(),
        })
        .collect()
}

fn parse_tables(ddl: &str) -> Vec<TableInfo> {
    let mut tables = Vec::new();
    for captures in table_header_regex().captures_iter(ddl) {
        let Some(header) = captures.get(0) else {
            continue;
        };
        let Some(body) = balanced_body(&ddl[header.end()..]) else {
            continue;
        };

        tables.push(TableInfo {
            name: captures[1].to_string(),
            columns: split_definitions(body)
                .into_iter()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !is_constraint_line(line))
                .filter_map(parse_column)
                .collect(),
        });
    }
    tables
}

// The header match consumes the opening parenthesis, so the scan starts at depth one.
fn balanced_body(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut in_quote = false;
    for (index, ch) in rest.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..index]);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_definitions(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0usize;

    for (index, ch) in body.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn is_constraint_line(line: &str) -> bool {
    let mut words = line
        .split(|ch: char| ch.is_whitespace() || ch == '(')
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_uppercase);
    let first = words.next().unwrap_or_default();
    match first.as_str() {
        "CONSTRAINT" | "UNIQUE" | "CHECK" => true,
        "PRIMARY" | "FOREIGN" => words.next().is_some_and(|second| second == "KEY"),
        _ => false,
    }
}

fn parse_column(line: &str) -> Option<ColumnInfo> {
    let captures = column_regex().captures(line)?;
    let name = captures[1].to_string();
    let rest = captures[2].split_whitespace().collect::<Vec<_>>().join(" ");
    let upper = rest.to_ascii_uppercase();

    let data_type = type_regex()
        .captures(&rest)
        .map(|captures| captures[1].trim().to_string())
        .filter(|data_type| !data_type.is_empty())
        .or_else(|| rest.split_whitespace().next().map(ToString::to_string))
        .unwrap_or_default();

    let is_primary_key = upper.contains("PRIMARY KEY");
    let not_null = upper.contains("NOT NULL");

    let default_value = default_regex()
        .captures(&rest)
        .map(|captures| captures[1].to_string());

    let foreign_key = references_regex()
        .captures(&rest)
        .map(|captures| ForeignKeyRef {
            table: captures[1].to_string(),
            column: captures[2].to_string(),
        });

    Some(ColumnInfo {
        name,
        data_type,
        nullable: !not_null && !is_primary_key,
        is_primary_key,
        foreign_key,
        default_value,
    })
}

fn line_comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?m)--.*$").expect("ddl comment regex should compile"))
}

fn enum_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?i)CREATE\s+TYPE\s+(?:"?\w+"?\.)?"?(\w+)"?\s+AS\s+ENUM\s*\(([^)]+)\)"#)
            .expect("enum regex should compile")
    })
}

fn table_header_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r#"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"?\w+"?\.)?"?(\w+)"?\s*\("#,
        )
        .expect("table header regex should compile")
    })
}

fn column_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?s)^"?(\w+)"?\s+(.+)$"#).expect("column regex should compile")
    })
}

fn type_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)^([\w\s(),.\[\]]+?)(?:\s+(?:{TYPE_TERMINATORS})\b|$)"
        ))
        .expect("column type regex should compile")
    })
}

fn default_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bDEFAULT\s+([^,\s]+(?:\([^)]*\))?)").expect("default regex should compile")
    })
}

fn references_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\bREFERENCES\s+(?:"?\w+"?\.)?"?(\w+)"?\s*\(\s*"?(\w+)"?\s*\)"#)
            .expect("references regex should compile")
    })
}
