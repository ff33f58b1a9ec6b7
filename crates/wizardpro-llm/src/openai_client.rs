//! OpenAI chat completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use wizardpro_config::Config;

use crate::error::{CallError, LlmError};
use crate::http_client::{
    DEFAULT_REQUEST_TIMEOUT, HttpTransport, api_key_from_env, wire_model,
};
use crate::{GenerationClient, GenerationRequest, GenerationResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const PROVIDER: &str = "openai";

/// Client for `POST {base_url}/chat/completions`
#[derive(Clone)]
pub struct OpenAiClient {
    http: HttpTransport,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns `LlmError::Transport` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: HttpTransport::new(timeout)?,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
        })
    }

    /// Create a client from `[llm.openai]`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key variable is unset
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let section = config.llm.openai.as_ref();
        let api_key_env = section
            .and_then(|s| s.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = api_key_from_env(api_key_env, "llm.openai")?;
        let timeout = section
            .and_then(|s| s.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self::new(api_key, section.and_then(|s| s.base_url.clone()), timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(request: &GenerationRequest) -> ChatRequest<'_> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: wire_model(&request.model, PROVIDER),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        }
    }

    fn parse_response(
        model: &str,
        raw: serde_json::Value,
    ) -> Result<GenerationResponse, CallError> {
        let parsed: ChatResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            CallError::Unexpected(format!("OpenAI response has an unexpected shape: {e}"))
        })?;

        let Some(choice) = parsed.choices.into_iter().next() else {
            return Ok(GenerationResponse::failed(model, "OpenAI response contained no choices")
                .with_raw(raw));
        };

        let text = choice
            .message
            .and_then(|m| m.content)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            warn!(provider = PROVIDER, model, "OpenAI returned empty content");
        }

        let mut response = GenerationResponse::ok(model, text).with_raw(raw);
        response.finish_reason = choice.finish_reason;
        Ok(response)
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        let body = Self::request_body(request);
        debug!(
            provider = PROVIDER,
            model = body.model,
            max_tokens = body.max_tokens,
            temperature = body.temperature,
            "Invoking OpenAI chat completions"
        );

        let builder = self
            .http
            .client()
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);
        let raw = self.http.send_json(builder, PROVIDER).await?;
        Self::parse_response(&request.model, raw)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
