//! Shared HTTP plumbing for the OpenAI and Anthropic clients
//!
//! Performs exactly one request per call and classifies the outcome into a
//! [`CallError`]. Retrying is left to [`crate::ResilientExecutor`].

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{CallError, LlmError};

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-request timeout when the provider section does not set one
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Characters of an error body kept for diagnostics
const BODY_LIMIT: usize = 200;

/// Pooled `reqwest` client shared by one provider.
#[derive(Clone)]
pub(crate) struct HttpTransport {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns `LlmError::Transport` if the client cannot be constructed
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send one JSON request and return the decoded JSON body.
    pub async fn send_json(
        &self,
        request: RequestBuilder,
        provider: &str,
    ) -> Result<serde_json::Value, CallError> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, provider))?;

        let status = response.status();
        debug!(provider, status = status.as_u16(), "Received HTTP response");

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after, &body, provider));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            if e.is_timeout() {
                CallError::Timeout(format!("{provider} response body timed out"))
            } else {
                CallError::Unexpected(format!(
                    "{provider} returned a body that is not valid JSON: {}",
                    redact_error_message(&e.to_string())
                ))
            }
        })
    }
}

fn classify_send_error(err: &reqwest::Error, provider: &str) -> CallError {
    let detail = redact_error_message(&err.to_string());
    if err.is_timeout() {
        CallError::Timeout(format!("{provider} request timed out: {detail}"))
    } else if err.is_builder() {
        CallError::Unexpected(format!("{provider} request could not be built: {detail}"))
    } else {
        CallError::Connection(format!("{provider} request failed: {detail}"))
    }
}

/// Read an API key from the named environment variable.
///
/// An unset or blank variable is a misconfiguration.
pub(crate) fn api_key_from_env(env_var: &str, section: &str) -> Result<String, LlmError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::Misconfiguration(format!(
            "API key not found in environment variable '{env_var}'. \
             Set this variable or configure a different api_key_env in [{section}]."
        ))),
    }
}

/// Strip a `provider:` routing prefix from a model id for the wire.
pub(crate) fn wire_model<'a>(model: &'a str, prefix: &str) -> &'a str {
    model
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(model)
}

/// Map a non-success HTTP status to a [`CallError`]
///
/// - 429 → `RateLimited`, carrying the `Retry-After` hint
/// - 5xx → `Server`
/// - anything else → `Client` with the body cut to 200 characters
pub(crate) fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
    provider: &str,
) -> CallError {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    if status == StatusCode::TOO_MANY_REQUESTS {
        return CallError::RateLimited {
            retry_after,
            message: format!("{provider} rate limit exceeded: {reason}"),
        };
    }
    if status.is_server_error() {
        return CallError::Server {
            status: status.as_u16(),
            message: format!("{provider} returned server error: {reason}"),
        };
    }
    let body = redact_error_message(body);
    CallError::Client {
        status: status.as_u16(),
        message: reason.to_string(),
        body: body.chars().take(BODY_LIMIT).collect(),
    }
}

/// Parse a `Retry-After` value given in seconds.
///
/// HTTP-date values are not interpreted and yield `None`.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Pattern to match URLs with embedded credentials
static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s]+:[^@\s]+@").expect("static regex"));

/// Long token-like runs that may be API keys
static POTENTIAL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}(?:[^A-Za-z0-9_-]|$)")
        .expect("static regex")
});

/// Redact credentials from text before it is logged or persisted.
pub(crate) fn redact_error_message(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, "[REDACTED_KEY]");
    redacted.to_string()
}
