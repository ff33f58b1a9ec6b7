//! Request/response values exchanged with a generation service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Context key the HTTP clients read a system prompt from.
pub const SYSTEM_PROMPT_KEY: &str = "system_prompt";

/// Input to one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Target model id, optionally provider-prefixed (`openai:gpt-4o`)
    pub model: String,
    /// Instruction payload
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Nucleus sampling probability; omitted from the wire when unset
    pub top_p: Option<f32>,
    /// Opaque context passed through to the client
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_system_prompt(self, system: impl Into<String>) -> Self {
        self.with_context(SYSTEM_PROMPT_KEY, serde_json::Value::String(system.into()))
    }

    /// System prompt carried in the context map, if any
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.context.get(SYSTEM_PROMPT_KEY).and_then(|v| v.as_str())
    }
}

/// Outcome of a generation call.
///
/// A response is either ok (`error` is `None`) or failed (`error` is set).
/// Callers check `error`; empty `text` on its own is not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub model: String,
    pub text: String,
    /// Raw provider payload, never persisted in call history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
    pub cost: Option<f64>,
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
    pub finish_reason: Option<String>,
}

impl GenerationResponse {
    #[must_use]
    pub fn ok(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
            raw: None,
            cost: None,
            latency_ms: None,
            error: None,
            finish_reason: None,
        }
    }

    #[must_use]
    pub fn failed(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::ok(model, "")
        }
    }

    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
