use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::utils::time::generated_at_utc_now;

pub const COMMAND_ENVELOPE_SCHEMA_VERSION: &str = "reportgen.command-envelope.v1";

pub type CommandEnvelopeMeta = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelopeError {
    pub code: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub ok: bool,
    pub command: String,
    pub generated_at_utc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    pub meta: CommandEnvelopeMeta,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandEnvelopeError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Rejected,
    Runtime,
}

#[derive(Debug, Clone)]
pub struct CommandEnvelopeFailure {
    envelope: CommandEnvelope,
    class: FailureClass,
}

impl CommandEnvelopeFailure {
    #[must_use]
    pub fn runtime(envelope: CommandEnvelope) -> Self {
        Self {
            envelope,
            class: FailureClass::Runtime,
        }
    }

    #[must_use]
    pub fn rejected(envelope: CommandEnvelope) -> Self {
        Self {
            envelope,
            class: FailureClass::Rejected,
        }
    }

    #[must_use]
    pub fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    #[must_use]
    pub fn class(&self) -> FailureClass {
        self.class
    }
}

impl Display for CommandEnvelopeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.envelope) {
            Ok(encoded) => f.write_str(&encoded),
            Err(_) => f.write_str("command envelope serialization failure"),
        }
    }
}

impl std::error::Error for CommandEnvelopeFailure {}

impl CommandEnvelope {
    #[must_use]
    pub fn ok(command: impl Into<String>, data: Value) -> Self {
        Self::base(command, true).with_data(data)
    }

    #[must_use]
    pub fn error(
        command: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut envelope = Self::base(command, false);
        envelope.error = Some(CommandEnvelopeError {
            code: code.into(),
            message: message.into(),
            details: None,
        });
        envelope
    }

    fn base(command: impl Into<String>, ok: bool) -> Self {
        let mut meta = CommandEnvelopeMeta::new();
        meta.insert(
            "schema_version".to_string(),
            json!(COMMAND_ENVELOPE_SCHEMA_VERSION),
        );

        Self {
            ok,
            command: command.into(),
            generated_at_utc: generated_at_utc_now(),
            data: None,
            meta,
            error: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_error_details(mut self, details: Value) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.details = Some(details);
        }
        self
    }
}
