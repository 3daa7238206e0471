use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::generate::{GenerateError, GenerationOutcome};
use crate::models::{ExecutedComponent, ResolvedAction};
use crate::modify::{ApplyError, ModifyError, apply_action};
use crate::services::Services;
use crate::validate::{ValidationErrors, validate_components_payload};

pub type AppState = Arc<Services>;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }

    fn internal(message: &str, cause: impl std::fmt::Display) -> Self {
        let cause = cause.to_string();
        tracing::error!(%cause, "{message}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": message, "details": cause }),
        )
    }

    fn invalid_components(errors: ValidationErrors) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Invalid components provided",
                "details": errors.into_issues(),
            }),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid JSON body", "details": rejection.body_text() }),
        )
    }
}

impl From<ModifyError> for ApiError {
    fn from(error: ModifyError) -> Self {
        let message = error.to_string();
        match error {
            ModifyError::EmptyPrompt | ModifyError::NoComponents => {
                Self::message(StatusCode::BAD_REQUEST, message)
            }
            ModifyError::ModelCall(source) => {
                Self::internal("Failed to parse modification action", source)
            }
            ModifyError::InvalidAction { errors, received } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Invalid action data",
                    "details": errors.into_issues(),
                    "received": received,
                }),
            ),
            ModifyError::MissingActionField { .. } => {
                Self::message(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ModifyError::ComponentNotFound { available, .. } => Self::new(
                StatusCode::NOT_FOUND,
                json!({ "error": message, "availableComponents": available }),
            ),
            ModifyError::AmbiguousComponent { candidates, .. } => Self::new(
                StatusCode::NOT_FOUND,
                json!({ "error": message, "candidates": candidates }),
            ),
        }
    }
}

impl From<ApplyError> for ApiError {
    fn from(error: ApplyError) -> Self {
        let status = match error {
            ApplyError::ComponentNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::message(status, error.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/schema", get(schema))
        .route("/api/schema/refresh", post(refresh_schema))
        .route("/api/generate-report", post(generate_report))
        .route("/api/execute-query", post(execute_query))
        .route("/api/modify-report", post(modify_report))
        .route("/api/apply-action", post(apply_modification))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(%bind, "reportgen server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn prompt_field(body: &Value) -> Option<&str> {
    body.get("prompt")
        .and_then(Value::as_str)
        .filter(|prompt| !prompt.trim().is_empty())
}

fn components_json(executed: &[ExecutedComponent]) -> Result<Vec<Value>, ApiError> {
    executed
        .iter()
        .map(ExecutedComponent::to_json)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| ApiError::internal("Failed to encode component results", error))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn schema(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let description = state
        .schema
        .describe()
        .map_err(|error| ApiError::internal("Failed to load database schema", error))?;
    Ok(Json(json!({
        "source": state.schema.source().label(),
        "schema": description,
    })))
}

async fn refresh_schema(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.schema.invalidate();
    state
        .schema
        .get()
        .map_err(|error| ApiError::internal("Failed to load database schema", error))?;
    Ok(Json(json!({
        "refreshed": true,
        "source": state.schema.source().label(),
    })))
}

async fn generate_report(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let prompt = prompt_field(&body)
        .ok_or_else(|| ApiError::message(StatusCode::BAD_REQUEST, "Prompt is required"))?;

    match state.generator.generate(prompt).await {
        Ok(GenerationOutcome::Generated(report)) => Ok(Json(report.response_body()).into_response()),
        Ok(GenerationOutcome::Rejected(rejection)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(rejection.response_body()),
        )
            .into_response()),
        Err(GenerateError::EmptyPrompt) => {
            Err(ApiError::message(StatusCode::BAD_REQUEST, "Prompt is required"))
        }
        Err(GenerateError::Schema(error)) => {
            Err(ApiError::internal("Failed to load database schema", error))
        }
        Err(error @ GenerateError::ModelCall { .. }) => {
            Err(ApiError::internal("Failed to generate report", error))
        }
    }
}

async fn execute_query(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let components = validate_components_payload(&body).map_err(ApiError::invalid_components)?;

    let executed = state.engine.execute_all(components).await;
    let failed = executed
        .iter()
        .filter(|component| component.outcome.is_err())
        .count();
    tracing::info!(
        components = executed.len(),
        failed,
        "components executed"
    );
    Ok(Json(json!({ "components": components_json(&executed)? })))
}

async fn modify_report(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let Some(prompt) = prompt_field(&body) else {
        return Err(ModifyError::EmptyPrompt.into());
    };
    let has_components = body
        .get("components")
        .and_then(Value::as_array)
        .is_some_and(|components| !components.is_empty());
    if !has_components {
        return Err(ModifyError::NoComponents.into());
    }

    let components = validate_components_payload(&body).map_err(ApiError::invalid_components)?;
    let resolved = state.parser.parse(prompt, &components).await?;

    serde_json::to_value(&resolved)
        .map(Json)
        .map_err(|error| ApiError::internal("Failed to encode modification action", error))
}

async fn apply_modification(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let mut components =
        validate_components_payload(&body).map_err(ApiError::invalid_components)?;
    let action = body
        .get("action")
        .cloned()
        .ok_or_else(|| ApiError::message(StatusCode::BAD_REQUEST, "Action is required"))
        .and_then(|action| {
            serde_json::from_value::<ResolvedAction>(action).map_err(|error| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Invalid action data", "details": error.to_string() }),
                )
            })
        })?;

    apply_action(&mut components, &action)?;
    Ok(Json(json!({ "components": components })))
}
