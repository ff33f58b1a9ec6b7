use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use wizardpro_utils::types::ConfigSource;

/// Model used when neither the phase nor `[defaults]` names one.
pub const DEFAULT_MODEL: &str = "openai:gpt-3.5-turbo";

/// Default location for persisted run state, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".wizardpro/runs";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_INITIAL_BACKOFF_SECS: f64 = 1.0;
pub const DEFAULT_MAX_BACKOFF_SECS: f64 = 10.0;
pub const DEFAULT_RATE_LIMIT_MIN_WAIT_SECS: f64 = 25.0;

/// Upper bound for every `[retry]` duration.
pub const MAX_RETRY_WAIT_SECS: f64 = 3600.0;

/// Configuration for wizardpro runs.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that:
/// - Uses an explicit `--config` path when given
/// - Otherwise reads `$WIZARDPRO_HOME/config.toml` when that variable is set
/// - Otherwise searches for `.wizardpro/config.toml` upward from the current directory
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `config`, `programmatic`, or `default`)
/// for debugging and status display.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// model = "openai:gpt-4o-mini"
/// state_dir = ".wizardpro/runs"
/// verbose = false
///
/// [retry]
/// max_attempts = 4
/// initial_backoff_secs = 1.0
/// max_backoff_secs = 10.0
/// rate_limit_min_wait_secs = 25.0
///
/// [llm.openai]
/// api_key_env = "OPENAI_API_KEY"
///
/// [llm.anthropic]
/// api_key_env = "ANTHROPIC_API_KEY"
/// timeout_secs = 120
///
/// [phases.Phase3_CodeGeneration]
/// model = "anthropic:claude-3-5-sonnet-latest"
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Default values for various settings.
    pub defaults: Defaults,
    /// Retry and backoff parameters for generation calls.
    pub retry: RetryConfig,
    /// HTTP provider configuration.
    pub llm: LlmConfig,
    /// Per-phase overrides keyed by phase name.
    pub phases: HashMap<String, PhaseConfig>,
    /// Source attribution for each setting (for status display).
    pub source_attribution: HashMap<String, ConfigSource>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub model: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
}

/// `[retry]` section. Unset keys fall back to the `DEFAULT_*` constants.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub initial_backoff_secs: Option<f64>,
    pub max_backoff_secs: Option<f64>,
    pub rate_limit_min_wait_secs: Option<f64>,
}

impl RetryConfig {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    #[must_use]
    pub fn initial_backoff_secs(&self) -> f64 {
        self.initial_backoff_secs
            .unwrap_or(DEFAULT_INITIAL_BACKOFF_SECS)
    }

    #[must_use]
    pub fn max_backoff_secs(&self) -> f64 {
        self.max_backoff_secs.unwrap_or(DEFAULT_MAX_BACKOFF_SECS)
    }

    #[must_use]
    pub fn rate_limit_min_wait_secs(&self) -> f64 {
        self.rate_limit_min_wait_secs
            .unwrap_or(DEFAULT_RATE_LIMIT_MIN_WAIT_SECS)
    }
}

/// `[llm]` section: one optional table per HTTP provider
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    pub openai: Option<ProviderConfig>,
    pub anthropic: Option<ProviderConfig>,
}

/// HTTP provider settings shared by the OpenAI and Anthropic clients
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Per-phase configuration overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    /// Model to use for this phase (overrides defaults.model)
    pub model: Option<String>,
}
