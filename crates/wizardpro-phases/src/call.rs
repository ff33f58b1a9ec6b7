use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use wizardpro_llm::{GenerationRequest, GenerationResponse, ProviderRegistry};
use wizardpro_phase_api::{LogLevel, RunState};

/// What every phase needs to make generation calls: the shared registry
/// and the model configured for that phase.
#[derive(Debug, Clone)]
pub struct PhaseLlm {
    registry: Arc<ProviderRegistry>,
    model: String,
}

impl PhaseLlm {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, model: impl Into<String>) -> Self {
        Self {
            registry,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Make one call on behalf of `phase`.
    ///
    /// The response is appended to `call_history` whatever the outcome. A
    /// failed response also gets an `ERROR` event log entry; deciding
    /// whether that halts the phase is left to the caller.
    pub async fn call(
        &self,
        state: &mut RunState,
        phase: &str,
        prompt_key: &str,
        prompt: String,
    ) -> GenerationResponse {
        let request = GenerationRequest::new(&self.model, prompt)
            .with_context("run_id", json!(state.run_id))
            .with_context("phase", json!(phase))
            .with_context("prompt_key", json!(prompt_key));

        let response = self.registry.execute(&request).await;
        state.record_call(phase, &response);

        match &response.error {
            Some(err) => {
                error!(
                    phase,
                    model = %self.model,
                    prompt_key,
                    error = %err,
                    "Generation call failed"
                );
                state.log(
                    phase,
                    LogLevel::Error,
                    format!(
                        "LLM call failed for model '{}' on prompt key '{prompt_key}'",
                        self.model
                    ),
                    Some(err.clone()),
                );
            }
            None => info!(
                phase,
                model = %self.model,
                prompt_key,
                latency_ms = ?response.latency_ms,
                "Generation call succeeded"
            ),
        }
        response
    }
}
