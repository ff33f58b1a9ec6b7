//! Retrying wrapper around a single [`GenerationClient`]

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::error::{CallError, FailureClass};
use crate::retry::RetryPolicy;
use crate::{GenerationClient, GenerationRequest, GenerationResponse};

/// Characters of a failing response body kept in the error text
const BODY_EXCERPT_CHARS: usize = 200;

/// Executes generation calls with bounded retries.
///
/// `execute` never returns an error: every failure path produces a failed
/// [`GenerationResponse`] whose `error` describes what happened, and
/// `latency_ms` always covers the whole call including waits.
#[derive(Clone)]
pub struct ResilientExecutor {
    client: Arc<dyn GenerationClient>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ResilientExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientExecutor")
            .field("provider", &self.client.provider())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ResilientExecutor {
    #[must_use]
    pub fn new(client: Arc<dyn GenerationClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute(&self, request: &GenerationRequest) -> GenerationResponse {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<CallError> = None;
        let mut outcome: Option<GenerationResponse> = None;

        for attempt in 0..max_attempts {
            debug!(
                provider = self.client.provider(),
                model = %request.model,
                attempt = attempt + 1,
                max_attempts,
                "Starting generation attempt"
            );

            match self.client.attempt(request).await {
                Ok(response) => {
                    if let Some(err) = &response.error {
                        warn!(model = %request.model, error = %err, "Generation returned a logical error");
                    }
                    outcome = Some(response);
                    break;
                }
                Err(err) if err.is_retryable() => {
                    let is_last = attempt + 1 == max_attempts;
                    if is_last {
                        warn!(
                            model = %request.model,
                            attempt = attempt + 1,
                            error = %err,
                            "Retryable failure on final attempt"
                        );
                        last_error = Some(err);
                        break;
                    }
                    let wait = self.policy.wait_for(&err, attempt);
                    warn!(
                        model = %request.model,
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "Retryable failure, waiting before next attempt"
                    );
                    last_error = Some(err);
                    tokio::time::sleep(wait).await;
                }
                Err(err) => {
                    error!(model = %request.model, error = %err, "Permanent generation failure");
                    outcome = Some(GenerationResponse::failed(
                        request.model.clone(),
                        permanent_failure_message(&err),
                    ));
                    break;
                }
            }
        }

        let mut response = outcome.unwrap_or_else(|| {
            let last = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "none recorded".to_string());
            GenerationResponse::failed(
                request.model.clone(),
                format!(
                    "Generation call failed after {max_attempts} attempts for {} (last error: {last})",
                    request.model
                ),
            )
        });

        if response.model.is_empty() {
            response.model = request.model.clone();
        }
        response.latency_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
        response
    }
}

fn permanent_failure_message(err: &CallError) -> String {
    match (err.class(), err) {
        (
            FailureClass::Permanent,
            CallError::Client {
                status,
                message,
                body,
            },
        ) => {
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            format!("API request failed (HTTP {status}): {message} | Resp: {excerpt}")
        }
        (FailureClass::ContractViolation, _) => err.to_string(),
        _ => format!("Unexpected error during generation call: {err}"),
    }
}
