pub mod anthropic;

use async_trait::async_trait;
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub use anthropic::AnthropicClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolSpec {
    #[must_use]
    pub fn for_type<T: JsonSchema>(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: input_schema_for::<T>(),
        }
    }
}

#[must_use]
pub fn input_schema_for<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();

    match serde_json::to_value(schema) {
        Ok(Value::Object(mut object)) => {
            object.remove("$schema");
            object.remove("title");
            Value::Object(object)
        }
        Ok(other) => other,
        Err(error) => {
            tracing::warn!(%error, "tool schema serialization failed; using an open object schema");
            json!({ "type": "object" })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tool: ToolSpec,
    pub max_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelCallError {
    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response did not contain a `{tool}` tool call")]
    MissingToolCall { tool: String },

    #[error("failed to decode model response: {0}")]
    Decode(String),

    #[error("language model is not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn call_structured(&self, request: StructuredRequest) -> Result<Value, ModelCallError>;
}

#[derive(Debug, Clone)]
pub struct UnconfiguredModel {
    reason: String,
}

impl UnconfiguredModel {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    async fn call_structured(&self, _request: StructuredRequest) -> Result<Value, ModelCallError> {
        Err(ModelCallError::NotConfigured(self.reason.clone()))
    }
}
