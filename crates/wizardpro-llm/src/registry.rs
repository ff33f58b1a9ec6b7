//! Model → provider routing

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use wizardpro_config::Config;

use crate::error::LlmError;
use crate::{
    AnthropicClient, GenerationClient, GenerationRequest, GenerationResponse, OpenAiClient,
    ResilientExecutor, RetryPolicy,
};

/// HTTP providers a model id can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Route a model id.
    ///
    /// Explicit `openai:` / `anthropic:` prefixes win. Otherwise a name
    /// containing `gpt` is OpenAI and one containing `claude` is Anthropic.
    #[must_use]
    pub fn resolve(model: &str) -> Option<Self> {
        let lower = model.trim().to_ascii_lowercase();
        if lower.starts_with("openai:") {
            Some(Self::OpenAi)
        } else if lower.starts_with("anthropic:") {
            Some(Self::Anthropic)
        } else if lower.contains("gpt") {
            Some(Self::OpenAi)
        } else if lower.contains("claude") {
            Some(Self::Anthropic)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds one client per provider plus exact-model overrides.
///
/// Built once per run; every phase asks it for a [`ResilientExecutor`]
/// that shares the same retry policy.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn GenerationClient>>,
    models: HashMap<String, Arc<dyn GenerationClient>>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.providers.keys().map(|p| p.as_str()).collect();
        providers.sort_unstable();
        let mut models: Vec<_> = self.models.keys().collect();
        models.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &providers)
            .field("models", &models)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ProviderRegistry {
    /// Empty registry; register clients before use
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
            policy,
        }
    }

    /// Build HTTP clients for every provider the given models need.
    ///
    /// API keys are read here, so a missing key fails the run before any
    /// phase executes.
    ///
    /// # Errors
    ///
    /// - `LlmError::Unsupported` if a model routes to no provider
    /// - `LlmError::Misconfiguration` if a needed API key is unset
    pub fn from_config<I, S>(config: &Config, models: I) -> Result<Self, LlmError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new(RetryPolicy::from_config(&config.retry));

        for model in models {
            let model = model.as_ref();
            let provider =
                Provider::resolve(model).ok_or_else(|| LlmError::Unsupported(model.to_string()))?;
            if registry.providers.contains_key(&provider) {
                continue;
            }
            let client: Arc<dyn GenerationClient> = match provider {
                Provider::OpenAi => Arc::new(OpenAiClient::new_from_config(config)?),
                Provider::Anthropic => Arc::new(AnthropicClient::new_from_config(config)?),
            };
            info!(provider = %provider, "Initialized generation provider");
            registry.providers.insert(provider, client);
        }

        Ok(registry)
    }

    pub fn register(&mut self, provider: Provider, client: Arc<dyn GenerationClient>) {
        self.providers.insert(provider, client);
    }

    #[must_use]
    pub fn with_client(mut self, provider: Provider, client: Arc<dyn GenerationClient>) -> Self {
        self.register(provider, client);
        self
    }

    /// Route one exact model id to `client`, bypassing prefix resolution
    pub fn register_model(&mut self, model: impl Into<String>, client: Arc<dyn GenerationClient>) {
        self.models.insert(model.into(), client);
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// # Errors
    ///
    /// - `LlmError::Unsupported` if the model routes to no provider
    /// - `LlmError::Misconfiguration` if its provider has no client
    pub fn client_for(&self, model: &str) -> Result<Arc<dyn GenerationClient>, LlmError> {
        if let Some(client) = self.models.get(model) {
            return Ok(Arc::clone(client));
        }
        let provider =
            Provider::resolve(model).ok_or_else(|| LlmError::Unsupported(model.to_string()))?;
        self.providers
            .get(&provider)
            .cloned()
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "model '{model}' needs the {provider} provider, which was not initialized"
                ))
            })
    }

    /// # Errors
    ///
    /// Same as [`ProviderRegistry::client_for`]
    pub fn executor_for(&self, model: &str) -> Result<ResilientExecutor, LlmError> {
        Ok(ResilientExecutor::new(
            self.client_for(model)?,
            self.policy.clone(),
        ))
    }

    /// Run a request through the executor for its model.
    ///
    /// Routing failures come back as a failed response, like any other
    /// permanent failure.
    pub async fn execute(&self, request: &GenerationRequest) -> GenerationResponse {
        match self.executor_for(&request.model) {
            Ok(executor) => executor.execute(request).await,
            Err(err) => {
                debug!(model = %request.model, error = %err, "No executor for model");
                let mut response = GenerationResponse::failed(request.model.clone(), err.to_string());
                response.latency_ms = Some(0.0);
                response
            }
        }
    }
}
