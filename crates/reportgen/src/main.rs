#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use reportgen::cli::app::{Cli, Command, RuntimeArgs};
use reportgen::cli::commands;
use reportgen::config::{self, AppConfig, RuntimePaths};
use reportgen::logging;
use reportgen::models::{CommandEnvelopeFailure, FailureClass};

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_VALIDATION_FAILURE: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let command_name = cli.command.name();

    let runtime_paths = match resolve_runtime_paths(&cli.runtime) {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("reportgen: failed `{command_name}` (exit_code={EXIT_RUNTIME_FAILURE})");
            eprintln!("{error:#}");
            return EXIT_RUNTIME_FAILURE;
        }
    };
    let dotenv = config::load_dotenv(&runtime_paths.cwd);
    logging::init_logging();
    match dotenv {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "environment file loaded"),
        Ok(None) => {}
        Err(error) => tracing::warn!(error = %format!("{error:#}"), "environment file ignored"),
    }

    tracing::info!(command = command_name, "starting");
    match execute(cli, runtime_paths) {
        Ok(()) => {
            tracing::info!(command = command_name, exit_code = EXIT_SUCCESS, "completed");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            match error.downcast_ref::<CommandEnvelopeFailure>() {
                Some(failure) => println!("{failure}"),
                None => eprintln!("{error:#}"),
            }
            eprintln!("reportgen: failed `{command_name}` (exit_code={exit_code})");
            exit_code
        }
    }
}

fn execute(cli: Cli, runtime_paths: RuntimePaths) -> Result<()> {
    if let Command::CheckSql(args) = &cli.command {
        return commands::check_sql::run(args);
    }

    let overrides = cli.runtime.overrides(cli.command.bind());
    let app_config = config::resolve_app_config(runtime_paths, &overrides, config::process_env)?;
    if let Command::Schema(args) = &cli.command {
        return commands::schema::run(args, &app_config);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run_async(cli.command, &app_config))
}

async fn run_async(command: Command, app_config: &AppConfig) -> Result<()> {
    match command {
        Command::Serve(_) => commands::serve::run(app_config).await,
        Command::Generate(args) => commands::generate::run(&args, app_config).await,
        Command::Execute(args) => commands::execute::run(&args, app_config).await,
        Command::Modify(args) => commands::modify::run(&args, app_config).await,
        Command::Schema(args) => commands::schema::run(&args, app_config),
        Command::CheckSql(args) => commands::check_sql::run(&args),
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CommandEnvelopeFailure>() {
        Some(failure) if failure.class() == FailureClass::Rejected => EXIT_VALIDATION_FAILURE,
        _ => EXIT_RUNTIME_FAILURE,
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    config::resolve_runtime_paths(&home_dir, &cwd)
}
