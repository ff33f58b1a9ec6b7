use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use wizardpro_utils::error::ConfigError;

use super::{CliArgs, Config, ConfigSource, Defaults, LlmConfig, PhaseConfig, RetryConfig};

/// Environment variable naming a directory that holds `config.toml`.
pub const HOME_ENV_VAR: &str = "WIZARDPRO_HOME";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    retry: Option<RetryConfig>,
    llm: Option<LlmConfig>,
    phases: Option<HashMap<String, PhaseConfig>>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory and `WIZARDPRO_HOME` for config
    /// file discovery when no explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let home = std::env::var_os(HOME_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::discover_with_home(start_dir, home.as_deref(), cli_args)
    }

    /// Path-driven variant used by tests to avoid process-global state.
    pub fn discover_with_home(
        start_dir: &Path,
        home: Option<&Path>,
        cli_args: &CliArgs,
    ) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut retry = RetryConfig::default();
        let mut llm = LlmConfig::default();
        let mut phases = HashMap::new();

        for key in [
            "model",
            "state_dir",
            "verbose",
            "retry_max_attempts",
            "retry_initial_backoff_secs",
            "retry_max_backoff_secs",
            "retry_rate_limit_min_wait_secs",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.clone(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => match home.map(|h| h.join("config.toml")).filter(|p| p.exists()) {
                Some(home_config) => Some(home_config),
                None => Self::discover_config_file_from(start_dir)?,
            },
        };

        if let Some(path) = &config_path {
            tracing::debug!(path = %path.display(), "Loading config file");
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let src = ConfigSource::Config;

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.model.is_some() {
                    defaults.model = file_defaults.model;
                    source_attribution.insert("model".to_string(), src);
                }
                if file_defaults.state_dir.is_some() {
                    defaults.state_dir = file_defaults.state_dir;
                    source_attribution.insert("state_dir".to_string(), src);
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), src);
                }
            }

            if let Some(file_retry) = file_config.retry {
                if file_retry.max_attempts.is_some() {
                    retry.max_attempts = file_retry.max_attempts;
                    source_attribution.insert("retry_max_attempts".to_string(), src);
                }
                if file_retry.initial_backoff_secs.is_some() {
                    retry.initial_backoff_secs = file_retry.initial_backoff_secs;
                    source_attribution.insert("retry_initial_backoff_secs".to_string(), src);
                }
                if file_retry.max_backoff_secs.is_some() {
                    retry.max_backoff_secs = file_retry.max_backoff_secs;
                    source_attribution.insert("retry_max_backoff_secs".to_string(), src);
                }
                if file_retry.rate_limit_min_wait_secs.is_some() {
                    retry.rate_limit_min_wait_secs = file_retry.rate_limit_min_wait_secs;
                    source_attribution.insert("retry_rate_limit_min_wait_secs".to_string(), src);
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.openai.is_some() {
                    llm.openai = file_llm.openai;
                    source_attribution.insert("llm_openai".to_string(), src);
                }
                if file_llm.anthropic.is_some() {
                    llm.anthropic = file_llm.anthropic;
                    source_attribution.insert("llm_anthropic".to_string(), src);
                }
            }

            if let Some(file_phases) = file_config.phases {
                phases = file_phases;
                source_attribution.insert("phases".to_string(), src);
            }
        }

        // CLI overrides (highest priority)
        if let Some(model) = &cli_args.model {
            defaults.model = Some(model.clone());
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(state_dir) = &cli_args.state_dir {
            defaults.state_dir = Some(state_dir.clone());
            source_attribution.insert("state_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(max_attempts) = cli_args.max_attempts {
            retry.max_attempts = Some(max_attempts);
            source_attribution.insert("retry_max_attempts".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            retry,
            llm,
            phases,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.wizardpro/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or the
    /// filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(".wizardpro").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current_dir = dir.parent();
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Discover configuration from environment and filesystem with no CLI overrides.
    pub fn discover_from_env_and_fs() -> Result<Self> {
        Self::discover(&CliArgs::default())
    }
}
