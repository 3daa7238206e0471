use std::sync::Arc;

use crate::config::{AppConfig, DatabaseBackend};
use crate::execute::{NoExecutor, PostgresExecutor, QueryEngine, SqlExecutor, SqliteExecutor};
use crate::generate::ReportGenerator;
use crate::llm::{AnthropicClient, LanguageModel, UnconfiguredModel};
use crate::modify::ModificationParser;
use crate::schema::SchemaCache;

pub struct Services {
    pub schema: Arc<SchemaCache>,
    pub generator: ReportGenerator,
    pub engine: QueryEngine,
    pub parser: ModificationParser,
}

impl Services {
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        executor: Arc<dyn SqlExecutor>,
        schema: Arc<SchemaCache>,
    ) -> Self {
        Self {
            generator: ReportGenerator::new(
                Arc::clone(&model),
                Arc::clone(&model),
                Arc::clone(&schema),
            ),
            engine: QueryEngine::new(executor),
            parser: ModificationParser::new(model),
            schema,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let schema = Arc::new(SchemaCache::new(config.schema_source()));
        tracing::info!(
            schema = %schema.source().label(),
            database = config.database.label(),
            model_configured = config.api_key.is_some(),
            "services configured"
        );
        Self::new(language_model(config), sql_executor(config), schema)
    }
}

#[must_use]
pub fn language_model(config: &AppConfig) -> Arc<dyn LanguageModel> {
    let Some(api_key) = &config.api_key else {
        return Arc::new(UnconfiguredModel::new("ANTHROPIC_API_KEY is not set"));
    };

    let mut client = AnthropicClient::new(api_key.expose());
    if let Some(base_url) = &config.base_url {
        client = client.with_base_url(base_url);
    }
    if let Some(model) = &config.model {
        client = client.with_model(model);
    }
    Arc::new(client)
}

#[must_use]
pub fn sql_executor(config: &AppConfig) -> Arc<dyn SqlExecutor> {
    match &config.database {
        DatabaseBackend::Postgres { url } => Arc::new(PostgresExecutor::new(url.clone())),
        DatabaseBackend::Sqlite { path } => Arc::new(SqliteExecutor::new(path.clone())),
        DatabaseBackend::Unconfigured => Arc::new(NoExecutor),
    }
}
