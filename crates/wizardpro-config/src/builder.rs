use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use wizardpro_utils::error::ConfigError;

use super::{Config, ConfigSource, Defaults, LlmConfig, PhaseConfig, ProviderConfig, RetryConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the engine and you want behavior independent
    /// of environment variables and config files.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use wizardpro_config::Config;
    ///
    /// let config = Config::builder()
    ///     .state_dir("/tmp/wizardpro-runs")
    ///     .model("openai:gpt-4o-mini")
    ///     .max_attempts(3)
    ///     .initial_backoff(Duration::from_millis(500))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.retry.max_attempts(), 3);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    state_dir: Option<PathBuf>,
    model: Option<String>,
    verbose: Option<bool>,
    retry: RetryConfig,
    llm: LlmConfig,
    phases: HashMap<String, PhaseConfig>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.retry.initial_backoff_secs = Some(backoff.as_secs_f64());
        self
    }

    #[must_use]
    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.retry.max_backoff_secs = Some(backoff.as_secs_f64());
        self
    }

    #[must_use]
    pub fn rate_limit_min_wait(mut self, wait: Duration) -> Self {
        self.retry.rate_limit_min_wait_secs = Some(wait.as_secs_f64());
        self
    }

    #[must_use]
    pub fn openai(mut self, provider: ProviderConfig) -> Self {
        self.llm.openai = Some(provider);
        self
    }

    #[must_use]
    pub fn anthropic(mut self, provider: ProviderConfig) -> Self {
        self.llm.anthropic = Some(provider);
        self
    }

    /// Override the model used by one phase.
    #[must_use]
    pub fn phase_model(mut self, phase: impl Into<String>, model: impl Into<String>) -> Self {
        self.phases.insert(
            phase.into(),
            PhaseConfig {
                model: Some(model.into()),
            },
        );
        self
    }

    /// Build the configuration, validating it like a discovered one.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let attribute = |set: bool| {
            if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            }
        };

        source_attribution.insert("model".to_string(), attribute(self.model.is_some()));
        source_attribution.insert("state_dir".to_string(), attribute(self.state_dir.is_some()));
        source_attribution.insert("verbose".to_string(), attribute(self.verbose.is_some()));
        source_attribution.insert(
            "retry_max_attempts".to_string(),
            attribute(self.retry.max_attempts.is_some()),
        );
        source_attribution.insert(
            "retry_initial_backoff_secs".to_string(),
            attribute(self.retry.initial_backoff_secs.is_some()),
        );
        source_attribution.insert(
            "retry_max_backoff_secs".to_string(),
            attribute(self.retry.max_backoff_secs.is_some()),
        );
        source_attribution.insert(
            "retry_rate_limit_min_wait_secs".to_string(),
            attribute(self.retry.rate_limit_min_wait_secs.is_some()),
        );
        if !self.phases.is_empty() {
            source_attribution.insert("phases".to_string(), ConfigSource::Programmatic);
        }

        let config = Config {
            defaults: Defaults {
                model: self.model,
                state_dir: self.state_dir,
                verbose: self.verbose,
            },
            retry: self.retry,
            llm: self.llm,
            phases: self.phases,
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.retry.max_attempts(), crate::DEFAULT_MAX_ATTEMPTS);
        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_builder_values_attributed_programmatic() {
        let config = Config::builder()
            .model("anthropic:claude-3-5-haiku-latest")
            .state_dir("/tmp/runs")
            .rate_limit_min_wait(Duration::from_secs(2))
            .phase_model("Phase2_Architecture", "openai:gpt-4o")
            .build()
            .unwrap();

        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("retry_rate_limit_min_wait_secs"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(config.retry.rate_limit_min_wait_secs(), 2.0);
        assert_eq!(config.model_for_phase("Phase2_Architecture"), "openai:gpt-4o");
        assert_eq!(
            config.model_for_phase("Phase4_Testing"),
            "anthropic:claude-3-5-haiku-latest"
        );
    }

    #[test]
    fn test_builder_validates() {
        let err = Config::builder()
            .initial_backoff(Duration::from_secs(20))
            .max_backoff(Duration::from_secs(2))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
