//! Anthropic Messages API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use wizardpro_config::Config;

use crate::error::{CallError, LlmError};
use crate::http_client::{
    DEFAULT_REQUEST_TIMEOUT, HttpTransport, api_key_from_env, wire_model,
};
use crate::{GenerationClient, GenerationRequest, GenerationResponse};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const PROVIDER: &str = "anthropic";

#[derive(Clone)]
pub struct AnthropicClient {
    http: HttpTransport,
    base_url: String,
    api_key: String,
}

impl AnthropicClient {
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

    /// Create a client from `[llm.anthropic]`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key variable is unset
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let section = config.llm.anthropic.as_ref();
        let api_key_env = section
            .and_then(|s| s.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = api_key_from_env(api_key_env, "llm.anthropic")?;
        let timeout = section
            .and_then(|s| s.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self::new(api_key, section.and_then(|s| s.base_url.clone()), timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    fn request_body(request: &GenerationRequest) -> MessagesRequest<'_> {
        MessagesRequest {
            model: wire_model(&request.model, PROVIDER),
            system: request.system_prompt().unwrap_or(DEFAULT_SYSTEM_PROMPT),
            messages: vec![MessagesMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        }
    }

    fn parse_response(
        model: &str,
        raw: serde_json::Value,
    ) -> Result<GenerationResponse, CallError> {
        let parsed: MessagesResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            CallError::Unexpected(format!("Anthropic response has an unexpected shape: {e}"))
        })?;

        if let Some(error) = parsed.error {
            return Ok(GenerationResponse::failed(
                model,
                format!("Anthropic returned an error: {}", error.message),
            )
            .with_raw(raw));
        }

        // Concatenate all text blocks; tool_use and other block types are ignored
        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();

        let mut response = GenerationResponse::ok(model, text).with_raw(raw);
        response.finish_reason = parsed.stop_reason;
        Ok(response)
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        let body = Self::request_body(request);
        debug!(
            provider = PROVIDER,
            model = body.model,
            max_tokens = body.max_tokens,
            "Invoking Anthropic messages"
        );

        let builder = self
            .http
            .client()
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let raw = self.http.send_json(builder, PROVIDER).await?;
        Self::parse_response(&request.model, raw)
    }
}

#[derive(Debug, Serialize)]
struct MessagesMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<MessagesMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_defaults_system_prompt() {
        let request = GenerationRequest::new("anthropic:claude-3-5-haiku-latest", "hello");
        let body = serde_json::to_value(AnthropicClient::request_body(&request)).unwrap();
        assert_eq!(body["model"], "claude-3-5-haiku-latest");
        assert_eq!(body["system"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(body["messages"][0]["content"], "hello");
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_request_body_uses_context_system_prompt() {
        let request = GenerationRequest::new("claude-3-opus", "hi").with_system_prompt("You design APIs.");
        let body = serde_json::to_value(AnthropicClient::request_body(&request)).unwrap();
        assert_eq!(body["system"], "You design APIs.");
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let raw = json!({
            "content": [
                {"type": "text", "text": "part one, "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "part two"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        });
        let resp = AnthropicClient::parse_response("anthropic:claude", raw).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.text, "part one, part two");
        assert_eq!(resp.finish_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_parse_response_error_body_is_logical_failure() {
        let raw = json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}});
        let resp = AnthropicClient::parse_response("claude", raw).unwrap();
        assert!(resp.error.unwrap().contains("Overloaded"));
    }
}
