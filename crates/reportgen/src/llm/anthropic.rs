use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{LanguageModel, ModelCallError, StructuredRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(&self, request: &StructuredRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": request.messages,
            "tools": [request.tool],
            "tool_choice": { "type": "tool", "name": request.tool.name },
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse {
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

fn extract_tool_input(response: MessagesResponse, tool: &str) -> Result<Value, ModelCallError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input } if name == tool => Some(input),
            _ => None,
        })
        .ok_or_else(|| ModelCallError::MissingToolCall {
            tool: tool.to_string(),
        })
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn call_structured(&self, request: StructuredRequest) -> Result<Value, ModelCallError> {
        let body = self.request_body(&request);
        tracing::debug!(
            model = %self.model,
            tool = %request.tool.name,
            messages = request.messages.len(),
            "calling messages api"
        );

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|error| ModelCallError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelCallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded = response
            .json::<MessagesResponse>()
            .await
            .map_err(|error| ModelCallError::Decode(error.to_string()))?;
        extract_tool_input(decoded, &request.tool.name)
    }
}
