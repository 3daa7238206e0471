use std::path::PathBuf;

use clap::Parser;
use reportgen::{Cli, Command};

#[test]
fn global_flags_are_accepted_after_the_subcommand() {
    let cli = Cli::parse_from([
        "reportgen",
        "schema",
        "--json",
        "--schema",
        "db/schema.sql",
        "--cwd",
        "/work/repo",
        "--home-dir",
        "/home/tester",
    ]);

    assert_eq!(cli.runtime.schema, Some(PathBuf::from("db/schema.sql")));
    assert_eq!(cli.runtime.cwd, Some(PathBuf::from("/work/repo")));
    assert_eq!(cli.runtime.home_dir, Some(PathBuf::from("/home/tester")));
    match cli.command {
        Command::Schema(args) => assert!(args.json),
        other => panic!("expected schema command, got {other:?}"),
    }
}

#[test]
fn database_flags_become_config_overrides() {
    let cli = Cli::parse_from([
        "reportgen",
        "--sqlite",
        "data/app.db",
        "--database-url",
        "postgres://localhost/analytics",
        "--model",
        "claude-test",
        "serve",
        "--bind",
        "0.0.0.0:8080",
    ]);

    assert_eq!(cli.command.name(), "serve");
    let overrides = cli.runtime.overrides(cli.command.bind());
    assert_eq!(overrides.sqlite, Some(PathBuf::from("data/app.db")));
    assert_eq!(
        overrides.database_url.as_deref(),
        Some("postgres://localhost/analytics")
    );
    assert_eq!(overrides.model.as_deref(), Some("claude-test"));
    assert_eq!(overrides.bind.as_deref(), Some("0.0.0.0:8080"));
}

#[test]
fn bind_is_only_taken_from_serve() {
    let cli = Cli::parse_from(["reportgen", "generate", "weekly signups by plan"]);

    assert_eq!(cli.command.bind(), None);
    match cli.command {
        Command::Generate(args) => assert_eq!(args.prompt, "weekly signups by plan"),
        other => panic!("expected generate command, got {other:?}"),
    }
}

#[test]
fn file_driven_commands_take_component_paths() {
    let cli = Cli::parse_from(["reportgen", "execute", "dashboard.json"]);
    match cli.command {
        Command::Execute(args) => assert_eq!(args.components, PathBuf::from("dashboard.json")),
        other => panic!("expected execute command, got {other:?}"),
    }

    let cli = Cli::parse_from([
        "reportgen",
        "modify",
        "move Signups up",
        "--components",
        "dashboard.json",
    ]);
    match cli.command {
        Command::Modify(args) => {
            assert_eq!(args.prompt, "move Signups up");
            assert_eq!(args.components, PathBuf::from("dashboard.json"));
        }
        other => panic!("expected modify command, got {other:?}"),
    }
}

#[test]
fn check_sql_takes_one_statement() {
    let cli = Cli::parse_from(["reportgen", "check-sql", "SELECT 1"]);
    assert_eq!(cli.command.name(), "check-sql");

    let error = Cli::try_parse_from(["reportgen", "modify", "move Signups up"])
        .expect_err("modify without --components must fail");
    assert_eq!(
        error.kind(),
        clap::error::ErrorKind::MissingRequiredArgument
    );
}
