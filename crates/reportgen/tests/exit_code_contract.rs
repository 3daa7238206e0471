use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use serde_json::Value;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

fn run_reportgen(dir: &Path, args: &[&str]) -> Output {
    let dir = dir.to_str().expect("temp dir should be utf-8");
    Command::new(env!("CARGO_BIN_EXE_reportgen"))
        .args(["--cwd", dir, "--home-dir", dir])
        .args(args)
        .env_remove("DATABASE_URL")
        .env_remove("SUPABASE_DB_URL")
        .env_remove("REPORTGEN_SCHEMA")
        .env_remove("ANTHROPIC_API_KEY")
        .env("RUST_LOG", "error")
        .output()
        .expect("reportgen binary should run")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be a json envelope")
}

#[test]
fn safe_statement_exits_zero_with_envelope() {
    let dir = unique_temp_dir("reportgen-exit-safe");
    fs::create_dir_all(&dir).expect("temp dir should be created");

    let output = run_reportgen(&dir, &["check-sql", "SELECT id FROM users -- all"]);
    assert_eq!(output.status.code(), Some(0));

    let envelope = stdout_json(&output);
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["command"], "check-sql");
    assert_eq!(envelope["data"]["sanitized"], "SELECT id FROM users");
    assert_eq!(envelope["meta"]["schema_version"], "reportgen.command-envelope.v1");

    fs::remove_dir_all(&dir).expect("temp dir should be removed");
}

#[test]
fn unsafe_statement_exits_two_with_error_envelope() {
    let dir = unique_temp_dir("reportgen-exit-unsafe");
    fs::create_dir_all(&dir).expect("temp dir should be created");

    let output = run_reportgen(&dir, &["check-sql", "DROP TABLE users"]);
    assert_eq!(output.status.code(), Some(2));

    let envelope = stdout_json(&output);
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["error"]["code"], "sql_guardrail_violation");
    assert_eq!(envelope["data"]["isValid"], false);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("reportgen: failed `check-sql` (exit_code=2)"),
        "unexpected stderr: {stderr}"
    );

    fs::remove_dir_all(&dir).expect("temp dir should be removed");
}

#[test]
fn usage_error_exits_sixty_four() {
    let output = Command::new(env!("CARGO_BIN_EXE_reportgen"))
        .arg("check-sql")
        .output()
        .expect("reportgen binary should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_schema_file_is_a_runtime_failure() {
    let dir = unique_temp_dir("reportgen-exit-schema");
    fs::create_dir_all(&dir).expect("temp dir should be created");

    let output = run_reportgen(&dir, &["schema"]);
    assert_eq!(output.status.code(), Some(1));

    let envelope = stdout_json(&output);
    assert_eq!(envelope["error"]["code"], "schema_unavailable");

    fs::remove_dir_all(&dir).expect("temp dir should be removed");
}

#[test]
fn schema_command_renders_ddl_from_cwd() {
    let dir = unique_temp_dir("reportgen-exit-render");
    fs::create_dir_all(&dir).expect("temp dir should be created");
    fs::write(
        dir.join("schema.sql"),
        "CREATE TABLE users (id uuid PRIMARY KEY, email text NOT NULL);",
    )
    .expect("schema file should be written");

    let output = run_reportgen(&dir, &["schema"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("#### users"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("| id | uuid | no | PK |"), "unexpected stdout: {stdout}");

    fs::remove_dir_all(&dir).expect("temp dir should be removed");
}

#[test]
fn execute_runs_components_against_sqlite() {
    let dir = unique_temp_dir("reportgen-exit-execute");
    fs::create_dir_all(&dir).expect("temp dir should be created");
    Connection::open(dir.join("app.db"))
        .expect("database should open")
        .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY); INSERT INTO users VALUES (1), (2);")
        .expect("fixture data should load");
    fs::write(
        dir.join("dashboard.json"),
        r#"[
            {"type": "kpi", "title": "Users", "query": "SELECT COUNT(*) AS value FROM users"},
            {"type": "kpi", "title": "Wipe", "query": "DELETE FROM users"}
        ]"#,
    )
    .expect("components file should be written");

    let output = run_reportgen(&dir, &["execute", "dashboard.json", "--sqlite", "app.db"]);
    assert_eq!(output.status.code(), Some(0));

    let envelope = stdout_json(&output);
    assert_eq!(envelope["data"]["components"][0]["value"], 2);
    assert!(envelope["data"]["components"][1]["error"].is_string());
    assert_eq!(envelope["meta"]["database"], "sqlite");
    assert_eq!(envelope["meta"]["failed_count"], 1);

    fs::remove_dir_all(&dir).expect("temp dir should be removed");
}

#[test]
fn invalid_components_file_exits_two() {
    let dir = unique_temp_dir("reportgen-exit-components");
    fs::create_dir_all(&dir).expect("temp dir should be created");
    fs::write(dir.join("dashboard.json"), r#"{"components": []}"#)
        .expect("components file should be written");

    let output = run_reportgen(&dir, &["execute", "dashboard.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["error"]["code"], "components_invalid");

    fs::remove_dir_all(&dir).expect("temp dir should be removed");
}
