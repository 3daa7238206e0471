use std::fmt::{Debug, Formatter};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::schema::SchemaSource;

pub const DEFAULT_SCHEMA_FILE: &str = "schema.sql";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_MODEL: &str = "REPORTGEN_MODEL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_SUPABASE_DB_URL: &str = "SUPABASE_DB_URL";
pub const ENV_SCHEMA: &str = "REPORTGEN_SCHEMA";
pub const ENV_BIND: &str = "REPORTGEN_BIND";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
}

impl RuntimePaths {
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        resolve_user_path(path, &self.home_dir, &self.cwd)
    }
}

pub fn resolve_runtime_paths(home_dir: &Path, cwd: &Path) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    Ok(RuntimePaths {
        home_dir: normalize_lexical(home_dir),
        cwd: normalize_lexical(cwd),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub schema: Option<PathBuf>,
    pub sqlite: Option<PathBuf>,
    pub database_url: Option<String>,
    pub model: Option<String>,
    pub bind: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres { url: String },
    Sqlite { path: PathBuf },
    Unconfigured,
}

impl DatabaseBackend {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Postgres { .. } => "postgres",
            Self::Sqlite { .. } => "sqlite",
            Self::Unconfigured => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub paths: RuntimePaths,
    pub schema_path: PathBuf,
    pub database: DatabaseBackend,
    pub api_key: Option<ApiKey>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub bind: SocketAddr,
}

impl AppConfig {
    // The DDL file when it exists; otherwise a configured SQLite database is
    // introspected directly. With neither, the DDL path is kept so the read
    // error names the missing file.
    #[must_use]
    pub fn schema_source(&self) -> SchemaSource {
        if self.schema_path.is_file() {
            return SchemaSource::DdlFile(self.schema_path.clone());
        }
        match &self.database {
            DatabaseBackend::Sqlite { path } => SchemaSource::Sqlite(path.clone()),
            _ => SchemaSource::DdlFile(self.schema_path.clone()),
        }
    }
}

#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn load_dotenv(cwd: &Path) -> Result<Option<PathBuf>> {
    let path = cwd.join(".env");
    if !path.is_file() {
        return Ok(None);
    }
    dotenvy::from_path(&path)
        .with_context(|| format!("failed to load environment file {}", path.display()))?;
    Ok(Some(path))
}

pub fn resolve_app_config<F>(
    paths: RuntimePaths,
    overrides: &ConfigOverrides,
    env: F,
) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    let schema_path = match overrides.schema.clone() {
        Some(path) => path,
        None => lookup(ENV_SCHEMA)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_FILE)),
    };
    let schema_path = paths.resolve(&schema_path)?;

    let database_url = overrides
        .database_url
        .clone()
        .or_else(|| lookup(ENV_DATABASE_URL))
        .or_else(|| lookup(ENV_SUPABASE_DB_URL));
    let database = match (database_url, &overrides.sqlite) {
        (Some(url), _) => DatabaseBackend::Postgres { url },
        (None, Some(path)) => DatabaseBackend::Sqlite {
            path: paths.resolve(path)?,
        },
        (None, None) => DatabaseBackend::Unconfigured,
    };

    let bind_raw = overrides
        .bind
        .clone()
        .or_else(|| lookup(ENV_BIND))
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let bind = bind_raw
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address: {bind_raw}"))?;

    Ok(AppConfig {
        paths,
        schema_path,
        database,
        api_key: lookup(ENV_API_KEY).map(ApiKey),
        base_url: lookup(ENV_BASE_URL),
        model: overrides.model.clone().or_else(|| lookup(ENV_MODEL)),
        bind,
    })
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}
