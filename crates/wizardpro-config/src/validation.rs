use wizardpro_utils::error::ConfigError;

use super::{Config, MAX_RETRY_WAIT_SECS};

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.defaults.model
            && model.trim().is_empty()
        {
            return Err(invalid("model", "must not be empty"));
        }

        for (phase, pc) in &self.phases {
            if let Some(model) = &pc.model
                && model.trim().is_empty()
            {
                return Err(invalid(&format!("phases.{phase}.model"), "must not be empty"));
            }
        }

        if self.retry.max_attempts() == 0 {
            return Err(invalid("retry.max_attempts", "must be greater than 0"));
        }
        if self.retry.max_attempts() > 20 {
            return Err(invalid("retry.max_attempts", "exceeds maximum limit of 20"));
        }

        for (key, secs) in [
            ("retry.initial_backoff_secs", self.retry.initial_backoff_secs()),
            ("retry.max_backoff_secs", self.retry.max_backoff_secs()),
            (
                "retry.rate_limit_min_wait_secs",
                self.retry.rate_limit_min_wait_secs(),
            ),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid(key, format!("must be a non-negative number, got {secs}")));
            }
            if secs > MAX_RETRY_WAIT_SECS {
                return Err(invalid(
                    key,
                    format!("{secs} exceeds maximum limit of {MAX_RETRY_WAIT_SECS} seconds"),
                ));
            }
        }

        if self.retry.initial_backoff_secs() > self.retry.max_backoff_secs() {
            return Err(invalid(
                "retry.initial_backoff_secs",
                format!(
                    "{} exceeds retry.max_backoff_secs ({})",
                    self.retry.initial_backoff_secs(),
                    self.retry.max_backoff_secs()
                ),
            ));
        }

        for (name, provider) in [("openai", &self.llm.openai), ("anthropic", &self.llm.anthropic)] {
            let Some(provider) = provider else { continue };
            if let Some(env) = &provider.api_key_env
                && env.trim().is_empty()
            {
                return Err(invalid(&format!("llm.{name}.api_key_env"), "must not be empty"));
            }
            if provider.timeout_secs == Some(0) {
                return Err(invalid(
                    &format!("llm.{name}.timeout_secs"),
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{CliArgs, Config, MAX_RETRY_WAIT_SECS};
    use std::fs;
    use tempfile::TempDir;
    use wizardpro_utils::error::ConfigError;

    fn discover_with(content: &str) -> anyhow::Result<Config> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, content)?;
        let cli = CliArgs {
            config_path: Some(path),
            ..Default::default()
        };
        Config::discover_with_home(temp_dir.path(), None, &cli)
    }

    fn invalid_key(err: &anyhow::Error) -> Option<String> {
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::InvalidValue { key, .. }) => Some(key.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let err = discover_with("[retry]\nmax_attempts = 0\n").unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("retry.max_attempts"));
    }

    #[test]
    fn test_zero_max_attempts_from_cli_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliArgs {
            max_attempts: Some(0),
            ..Default::default()
        };
        let err = Config::discover_with_home(temp_dir.path(), None, &cli).unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("retry.max_attempts"));
    }

    #[test]
    fn test_initial_backoff_above_max_rejected() {
        let err =
            discover_with("[retry]\ninitial_backoff_secs = 30.0\nmax_backoff_secs = 5.0\n")
                .unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("retry.initial_backoff_secs"));
    }

    #[test]
    fn test_initial_backoff_checked_against_default_max() {
        let err = discover_with("[retry]\ninitial_backoff_secs = 11.0\n").unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("retry.initial_backoff_secs"));
    }

    #[test]
    fn test_retry_waits_above_cap_rejected() {
        let err = discover_with("[retry]\nmax_backoff_secs = 1e20\n").unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("retry.max_backoff_secs"));

        let err = discover_with("[retry]\nrate_limit_min_wait_secs = 7200.0\n").unwrap_err();
        assert_eq!(
            invalid_key(&err).as_deref(),
            Some("retry.rate_limit_min_wait_secs")
        );

        let config = discover_with("[retry]\nmax_backoff_secs = 3600.0\n").unwrap();
        assert_eq!(config.retry.max_backoff_secs(), MAX_RETRY_WAIT_SECS);
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = discover_with("[defaults]\nmodel = \"  \"\n").unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("model"));

        let err = discover_with("[phases.Phase1_Requirements]\nmodel = \"\"\n").unwrap_err();
        assert_eq!(
            invalid_key(&err).as_deref(),
            Some("phases.Phase1_Requirements.model")
        );
    }

    #[test]
    fn test_zero_provider_timeout_rejected() {
        let err = discover_with("[llm.openai]\ntimeout_secs = 0\n").unwrap_err();
        assert_eq!(invalid_key(&err).as_deref(), Some("llm.openai.timeout_secs"));
    }

    #[test]
    fn test_valid_retry_section_accepted() {
        let config = discover_with(
            "[retry]\nmax_attempts = 2\ninitial_backoff_secs = 0.5\nmax_backoff_secs = 4.0\nrate_limit_min_wait_secs = 3.0\n",
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts(), 2);
        assert_eq!(config.retry.max_backoff_secs(), 4.0);
    }
}
