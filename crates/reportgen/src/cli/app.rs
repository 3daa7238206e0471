use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    check_sql::CheckSqlArgs, execute::ExecuteArgs, generate::GenerateArgs, modify::ModifyArgs,
    schema::SchemaArgs, serve::ServeArgs,
};
use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "reportgen",
    version,
    about = "Natural-language analytics reports over read-only SQL"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub schema: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub sqlite: Option<PathBuf>,

    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    #[arg(long, global = true, value_name = "NAME")]
    pub model: Option<String>,
}

impl RuntimeArgs {
    #[must_use]
    pub fn overrides(&self, bind: Option<&str>) -> ConfigOverrides {
        ConfigOverrides {
            schema: self.schema.clone(),
            sqlite: self.sqlite.clone(),
            database_url: self.database_url.clone(),
            model: self.model.clone(),
            bind: bind.map(ToString::to_string),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Serve(ServeArgs),
    Generate(GenerateArgs),
    Execute(ExecuteArgs),
    Modify(ModifyArgs),
    Schema(SchemaArgs),
    CheckSql(CheckSqlArgs),
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Serve(_) => "serve",
            Self::Generate(_) => "generate",
            Self::Execute(_) => "execute",
            Self::Modify(_) => "modify",
            Self::Schema(_) => "schema",
            Self::CheckSql(_) => "check-sql",
        }
    }

    #[must_use]
    pub fn bind(&self) -> Option<&str> {
        match self {
            Self::Serve(args) => args.bind.as_deref(),
            _ => None,
        }
    }
}
