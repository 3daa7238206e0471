pub mod postgres;
pub mod shape;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::guard::{SqlSafetyViolation, sanitize, validate_read_only_sql};
use crate::models::{Component, ComponentResult, ExecutedComponent, MetricSpec, MetricValue, Row};

pub use postgres::PostgresExecutor;
pub use sqlite::SqliteExecutor;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("unexpected query result: {0}")]
    Decode(String),

    #[error("no database is configured; set DATABASE_URL or pass --sqlite")]
    NotConfigured,
}

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, ExecutorError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoExecutor;

#[async_trait]
impl SqlExecutor for NoExecutor {
    async fn fetch_rows(&self, _sql: &str) -> Result<Vec<Row>, ExecutorError> {
        Err(ExecutorError::NotConfigured)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("SQL validation failed: {0}")]
    Unsafe(#[from] SqlSafetyViolation),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

#[derive(Clone)]
pub struct QueryEngine {
    executor: Arc<dyn SqlExecutor>,
}

impl QueryEngine {
    #[must_use]
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }

    pub async fn run_sql(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        validate_read_only_sql(sql)?;
        let sanitized = sanitize(sql);
        let rows = self.executor.fetch_rows(&sanitized).await?;
        tracing::debug!(rows = rows.len(), "query executed");
        Ok(rows)
    }

    async fn kpi(&self, sql: &str) -> Result<Value, ExecutionError> {
        let rows = self.run_sql(sql).await?;
        Ok(shape::kpi_value(&rows))
    }

    async fn metrics(&self, metrics: &[MetricSpec]) -> Result<Vec<MetricValue>, ExecutionError> {
        let values = join_all(metrics.iter().map(|metric| self.kpi(&metric.query))).await;
        metrics
            .iter()
            .zip(values)
            .map(|(metric, value)| {
                value.map(|value| MetricValue {
                    label: metric.label.clone(),
                    value,
                })
            })
            .collect()
    }

    pub async fn execute(&self, component: &Component) -> Result<ComponentResult, ExecutionError> {
        let result = match component {
            Component::Kpi(inner) => ComponentResult::Kpi(self.kpi(&inner.query).await?),
            Component::LineChart(inner) | Component::AreaChart(inner) => {
                ComponentResult::TimeSeries(shape::time_series(&self.run_sql(&inner.query).await?))
            }
            Component::BarChart(inner) | Component::HorizontalBarChart(inner) => {
                ComponentResult::Bars(shape::labeled(&self.run_sql(&inner.query).await?))
            }
            Component::PieChart(inner) | Component::DonutChart(inner) => {
                ComponentResult::Slices(shape::slices(&self.run_sql(&inner.query).await?))
            }
            Component::ScatterChart(inner) => {
                ComponentResult::Scatter(shape::scatter(&self.run_sql(&inner.query).await?))
            }
            Component::Table(table) => ComponentResult::Table(self.run_sql(&table.query).await?),
            Component::MetricsGrid(grid) => ComponentResult::Metrics(self.metrics(&grid.metrics).await?),
        };
        Ok(result)
    }

    pub async fn execute_all(&self, components: Vec<Component>) -> Vec<ExecutedComponent> {
        join_all(components.into_iter().map(|component| async move {
            let outcome = match self.execute(&component).await {
                Ok(result) => Ok(result),
                Err(error) => {
                    tracing::warn!(
                        component = %component.title(),
                        kind = component.kind().as_str(),
                        %error,
                        "component execution failed"
                    );
                    Err(error.to_string())
                }
            };
            ExecutedComponent { component, outcome }
        }))
        .await
    }
}
