//! Generation calls for wizardpro
//!
//! A phase builds a [`GenerationRequest`], hands it to a
//! [`ResilientExecutor`] (usually obtained from the [`ProviderRegistry`]),
//! and always gets a [`GenerationResponse`] back. Transport failures are
//! classified into [`CallError`] by each [`GenerationClient`]; the executor
//! decides from that class whether to wait and try again.

mod anthropic_client;
mod envelope;
mod error;
mod executor;
mod http_client;
mod openai_client;
mod registry;
mod retry;

pub use anthropic_client::AnthropicClient;
pub use envelope::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationRequest, GenerationResponse,
    SYSTEM_PROMPT_KEY,
};
pub use error::{CallError, FailureClass, LlmError};
pub use executor::ResilientExecutor;
pub use openai_client::OpenAiClient;
pub use registry::{Provider, ProviderRegistry};
pub use retry::RetryPolicy;

use async_trait::async_trait;

/// One attempt against an external generation service.
///
/// Implementations perform exactly one request and classify any transport
/// failure into a [`CallError`]. A response that arrived but carries
/// `error` is a logical failure and is returned as `Ok`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn provider(&self) -> &str;

    async fn attempt(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        Err(CallError::NotImplemented(format!(
            "attempt is not implemented for provider '{}' (model {})",
            self.provider(),
            request.model
        )))
    }
}
