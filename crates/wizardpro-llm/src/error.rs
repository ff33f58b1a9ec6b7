use std::time::Duration;
use thiserror::Error;
use wizardpro_utils::error::{ErrorCategory, UserFriendlyError};

/// Failure of a single attempt, as classified by a [`crate::GenerationClient`].
///
/// The executor never sees raw transport errors; each client maps its
/// failures into one of these variants and the executor picks the retry
/// behaviour from [`CallError::class`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// HTTP 429, with the server's `Retry-After` hint when one was sent
    #[error("rate limited: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// HTTP 5xx
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    /// Any other HTTP error status. `body` is already truncated for display.
    #[error("HTTP {status}: {message}")]
    Client {
        status: u16,
        message: String,
        body: String,
    },

    /// The collaborator does not implement the operation
    #[error("{0}")]
    NotImplemented(String),

    #[error("{0}")]
    Unexpected(String),
}

/// Retry-relevant classification of a [`CallError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimited,
    /// 5xx, timeouts, and connection failures
    Transient,
    /// Non-retryable HTTP status
    Permanent,
    ContractViolation,
    Unexpected,
}

impl FailureClass {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient)
    }
}

impl CallError {
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimited { .. } => FailureClass::RateLimited,
            Self::Server { .. } | Self::Timeout(_) | Self::Connection(_) => FailureClass::Transient,
            Self::Client { .. } => FailureClass::Permanent,
            Self::NotImplemented(_) => FailureClass::ContractViolation,
            Self::Unexpected(_) => FailureClass::Unexpected,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

/// Errors raised while setting up generation providers
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("Unsupported model: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Could not set up the HTTP transport: {msg}"),
            Self::Misconfiguration(msg) => format!("Generation provider is misconfigured: {msg}"),
            Self::Unsupported(model) => {
                format!("No generation provider handles model '{model}'")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Unsupported(_) => Some(
                "Models are routed by prefix: 'openai:' or a name containing 'gpt' goes to OpenAI, \
                 'anthropic:' or a name containing 'claude' goes to Anthropic."
                    .to_string(),
            ),
            Self::Misconfiguration(_) => {
                Some("API keys are read from environment variables when the run starts.".to_string())
            }
            Self::Transport(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec!["Check network and TLS settings".to_string()],
            Self::Misconfiguration(_) => vec![
                "Export OPENAI_API_KEY or ANTHROPIC_API_KEY".to_string(),
                "Or point [llm.<provider>].api_key_env at the variable holding the key".to_string(),
            ],
            Self::Unsupported(_) => vec![
                "Use a provider prefix such as 'openai:gpt-4o-mini'".to_string(),
                "Set [defaults].model or [phases.<name>].model in the config file".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Generation,
            Self::Misconfiguration(_) | Self::Unsupported(_) => ErrorCategory::Configuration,
        }
    }
}
