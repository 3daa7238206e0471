use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT",
    "UPDATE",
    "DELETE",
    "DROP",
    "ALTER",
    "TRUNCATE",
    "CREATE",
    "REPLACE",
    "GRANT",
    "REVOKE",
    "EXECUTE",
    "EXEC",
    "CALL",
    "BEGIN",
    "COMMIT",
    "ROLLBACK",
    "SAVEPOINT",
    "SET ",
    "COPY",
    "VACUUM",
    "ANALYZE",
    "CLUSTER",
    "REINDEX",
    "LOCK",
    "UNLOCK",
    "LOAD",
    "UNLOAD",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    EmptyStatement,
    EmptyAfterComments,
    UnsupportedStatement,
    ForbiddenKeyword,
    MultiStatement,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SqlSafetyViolation {
    pub reason: ViolationReason,
    pub detected_keyword: Option<String>,
    pub message: String,
}

impl SqlSafetyViolation {
    fn new(reason: ViolationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            detected_keyword: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn details(&self) -> Value {
        let mut violation = json!({ "reason": self.reason });
        if let Some(keyword) = &self.detected_keyword {
            violation["detected_keyword"] = json!(keyword);
        }
        json!({
            "allowed_forms": ["SELECT ...", "WITH ... SELECT ..."],
            "guardrail": "read_only_sql_single_statement",
            "violation": violation
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyVerdict {
    pub is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[must_use]
pub fn check(query: &str) -> SafetyVerdict {
    match validate_read_only_sql(query) {
        Ok(()) => SafetyVerdict {
            is_valid: true,
            error: None,
        },
        Err(violation) => SafetyVerdict {
            is_valid: false,
            error: Some(violation.message),
        },
    }
}

pub fn validate_read_only_sql(query: &str) -> Result<(), SqlSafetyViolation> {
    if query.is_empty() {
        return Err(SqlSafetyViolation::new(
            ViolationReason::EmptyStatement,
            "Query must be a non-empty string",
        ));
    }

    let normalized = normalize(query);
    if normalized.is_empty() {
        return Err(SqlSafetyViolation::new(
            ViolationReason::EmptyAfterComments,
            "Query is empty after removing comments",
        ));
    }

    if !normalized.starts_with("SELECT") && !normalized.starts_with("WITH") {
        return Err(SqlSafetyViolation::new(
            ViolationReason::UnsupportedStatement,
            "Query must start with SELECT or WITH (for CTEs). Only read-only queries are allowed.",
        ));
    }

    if let Some(keyword) = first_forbidden_keyword(&normalized) {
        let keyword = keyword.trim_end();
        return Err(SqlSafetyViolation {
            reason: ViolationReason::ForbiddenKeyword,
            detected_keyword: Some(keyword.to_string()),
            message: format!(
                "Forbidden SQL keyword detected: {keyword}. Only SELECT queries are allowed."
            ),
        });
    }

    let body = normalized.strip_suffix(';').unwrap_or(&normalized);
    if body.contains(';') {
        return Err(SqlSafetyViolation::new(
            ViolationReason::MultiStatement,
            "Multiple SQL statements detected. Only single SELECT queries are allowed.",
        ));
    }

    Ok(())
}

#[must_use]
pub fn sanitize(query: &str) -> String {
    strip_comments(query).trim().to_string()
}

fn normalize(query: &str) -> String {
    strip_comments(query)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

// Removing one comment can splice the text around it into a new comment
// opener, so stripping repeats until the text stops changing.
fn strip_comments(query: &str) -> String {
    let mut current = query.to_string();
    loop {
        let without_line = line_comment_regex().replace_all(&current, "");
        let stripped = block_comment_regex()
            .replace_all(&without_line, "")
            .into_owned();
        if stripped == current {
            return stripped;
        }
        current = stripped;
    }
}

fn first_forbidden_keyword(normalized: &str) -> Option<&'static str> {
    keyword_patterns()
        .iter()
        .find(|(_, pattern)| pattern.is_match(normalized))
        .map(|(keyword, _)| *keyword)
}

fn keyword_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FORBIDDEN_KEYWORDS
            .iter()
            .map(|keyword| {
                let pattern = format!(r"(?-u:\b){}(?-u:\b)", regex::escape(keyword));
                let regex = Regex::new(&pattern).expect("keyword regex should compile");
                (*keyword, regex)
            })
            .collect()
    })
}

fn line_comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?m)--.*$").expect("line comment regex should compile"))
}

fn block_comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex should compile"))
}

#[cfg(test)]
mod tests {
    use super::{ViolationReason, check, sanitize, validate_read_only_sql};

    #[test]
    fn allows_select_and_cte_with_optional_trailing_semicolon() {
        assert!(validate_read_only_sql("SELECT 1").is_ok());
        assert!(validate_read_only_sql("select 1 ; ").is_ok());
        assert!(validate_read_only_sql("WITH x AS (SELECT 1) SELECT * FROM x").is_ok());
    }

    #[test]
    fn rejects_keyword_after_valid_select() {
        let violation = validate_read_only_sql("SELECT 1; DROP TABLE x")
            .expect_err("trailing DROP must be rejected");
        assert_eq!(violation.reason, ViolationReason::ForbiddenKeyword);
        assert_eq!(violation.detected_keyword.as_deref(), Some("DROP"));
        assert!(violation.message.contains("DROP"));
    }

    #[test]
    fn keyword_match_is_whole_word() {
        assert!(validate_read_only_sql("SELECT updates, created_at FROM audit").is_ok());
        assert!(validate_read_only_sql("SELECT settings FROM prefs").is_ok());
    }

    #[test]
    fn set_keyword_requires_trailing_space() {
        let violation = validate_read_only_sql("SELECT 1 FROM t WHERE SET x = 1")
            .expect_err("SET clause must be rejected");
        assert_eq!(violation.detected_keyword.as_deref(), Some("SET"));
        assert_eq!(
            violation.message,
            "Forbidden SQL keyword detected: SET. Only SELECT queries are allowed."
        );
    }

    #[test]
    fn rejects_statements_that_do_not_start_with_select() {
        let violation =
            validate_read_only_sql("EXPLAIN SELECT 1").expect_err("EXPLAIN is not allowed");
        assert_eq!(violation.reason, ViolationReason::UnsupportedStatement);
    }

    #[test]
    fn rejects_empty_and_comment_only_queries() {
        assert_eq!(
            validate_read_only_sql("").map_err(|violation| violation.reason),
            Err(ViolationReason::EmptyStatement)
        );
        assert_eq!(
            validate_read_only_sql("-- nothing\n/* here */").map_err(|violation| violation.reason),
            Err(ViolationReason::EmptyAfterComments)
        );
    }

    #[test]
    fn rejects_interior_semicolons() {
        let violation =
            validate_read_only_sql("SELECT 1; SELECT 2;").expect_err("two statements");
        assert_eq!(violation.reason, ViolationReason::MultiStatement);
    }

    #[test]
    fn comment_splicing_cannot_hide_a_keyword() {
        let query = "SELECT DEL//**/* x */ETE FROM t";
        let first = validate_read_only_sql(query).map_err(|violation| violation.reason);
        let second = validate_read_only_sql(&sanitize(query)).map_err(|violation| violation.reason);
        assert_eq!(first, second);
        assert_eq!(first, Err(ViolationReason::ForbiddenKeyword));
    }

    #[test]
    fn verdict_carries_error_message() {
        let verdict = check("DELETE FROM users");
        assert!(!verdict.is_valid);
        assert!(verdict.error.is_some());
        assert!(check("SELECT 1").is_valid);
    }
}
