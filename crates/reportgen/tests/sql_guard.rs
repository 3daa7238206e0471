use reportgen::guard::{
    FORBIDDEN_KEYWORDS, ViolationReason, check, sanitize, validate_read_only_sql,
};
use serde_json::json;

#[test]
fn accepts_select_and_cte_statements() {
    for query in [
        "SELECT COUNT(*) AS value FROM users",
        "  select id, email from users where created_at > now() - interval '7 days'",
        "WITH recent AS (SELECT * FROM orders) SELECT COUNT(*) AS value FROM recent",
        "SELECT 1;",
        "SELECT 1 ;  \n",
        "-- daily signups\nSELECT created_at::date AS date, COUNT(*) AS value FROM users GROUP BY 1",
    ] {
        assert!(
            validate_read_only_sql(query).is_ok(),
            "expected {query:?} to be accepted"
        );
    }
}

#[test]
fn rejects_denylisted_keyword_after_valid_select() {
    let violation = validate_read_only_sql("SELECT 1; DROP TABLE x").expect_err("must reject");
    assert_eq!(violation.reason, ViolationReason::ForbiddenKeyword);
    assert_eq!(violation.detected_keyword.as_deref(), Some("DROP"));
    assert_eq!(
        violation.message,
        "Forbidden SQL keyword detected: DROP. Only SELECT queries are allowed."
    );

    let verdict = check("SELECT * FROM users WHERE id IN (SELECT id FROM t); DELETE FROM users");
    assert!(!verdict.is_valid);
    assert_eq!(
        verdict.error.as_deref(),
        Some("Forbidden SQL keyword detected: DELETE. Only SELECT queries are allowed.")
    );
}

#[test]
fn every_denylisted_keyword_is_rejected_as_a_whole_word() {
    for keyword in FORBIDDEN_KEYWORDS {
        let query = format!("SELECT a FROM t WHERE b = 1 {} x", keyword.trim().to_lowercase());
        let violation = validate_read_only_sql(&query)
            .expect_err(&format!("{keyword:?} should be rejected in {query:?}"));
        assert_eq!(violation.reason, ViolationReason::ForbiddenKeyword);
    }
}

#[test]
fn keywords_inside_identifiers_are_allowed() {
    for query in [
        "SELECT created_at, updated_at FROM users",
        "SELECT last_update AS value FROM audit",
        "SELECT dropped_count AS value FROM metrics",
    ] {
        assert!(
            validate_read_only_sql(query).is_ok(),
            "expected {query:?} to be accepted"
        );
    }
}

#[test]
fn denylist_fails_closed_on_colliding_identifiers() {
    let violation =
        validate_read_only_sql("SELECT lock FROM accounts").expect_err("identifier collides");
    assert_eq!(violation.detected_keyword.as_deref(), Some("LOCK"));
}

#[test]
fn rejects_non_select_empty_and_multi_statement_input() {
    let cases = [
        ("", ViolationReason::EmptyStatement),
        ("   ", ViolationReason::EmptyAfterComments),
        ("-- nothing here\n/* or here */", ViolationReason::EmptyAfterComments),
        ("SHOW TABLES", ViolationReason::UnsupportedStatement),
        ("EXPLAIN SELECT 1", ViolationReason::UnsupportedStatement),
        ("SELECT 1; SELECT 2", ViolationReason::MultiStatement),
        ("SELECT 1;;", ViolationReason::MultiStatement),
    ];
    for (query, reason) in cases {
        let violation = validate_read_only_sql(query).expect_err(&format!("{query:?} must fail"));
        assert_eq!(violation.reason, reason, "unexpected reason for {query:?}");
    }
}

#[test]
fn comments_cannot_hide_a_statement_prefix() {
    let violation = validate_read_only_sql("/* SELECT */ DELETE FROM users")
        .expect_err("comment prefix must not count");
    assert_eq!(violation.reason, ViolationReason::UnsupportedStatement);
}

#[test]
fn sanitize_then_validate_keeps_the_verdict() {
    for query in [
        "SELECT 1 -- trailing\n",
        "/* lead */ SELECT id FROM users",
        "SELECT 1; /* hidden */ UPDATE users SET name = 'x'",
        "WITH a AS (SELECT 1) SELECT * FROM a; SELECT 2",
        "SELECT DEL/* */ETE FROM t",
    ] {
        let direct = validate_read_only_sql(query).is_ok();
        let sanitized = validate_read_only_sql(&sanitize(query)).is_ok();
        assert_eq!(direct, sanitized, "verdict changed after sanitizing {query:?}");
    }
}

#[test]
fn sanitize_strips_comments_and_trims() {
    assert_eq!(
        sanitize("  -- note\nSELECT id /* pk */ FROM users  "),
        "SELECT id  FROM users"
    );
}

#[test]
fn violation_details_describe_the_guardrail() {
    let violation = validate_read_only_sql("SELECT 1; SET search_path = x")
        .expect_err("SET must be rejected");
    assert_eq!(
        violation.details(),
        json!({
            "allowed_forms": ["SELECT ...", "WITH ... SELECT ..."],
            "guardrail": "read_only_sql_single_statement",
            "violation": {
                "reason": "forbidden_keyword",
                "detected_keyword": "SET"
            }
        })
    );
}
