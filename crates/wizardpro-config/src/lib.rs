//! Configuration management for wizardpro
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. TOML files carry `[defaults]`, `[retry]`,
//! `[llm.openai]`, `[llm.anthropic]` and `[phases.<name>]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use wizardpro_utils::types::ConfigSource;

impl Config {
    /// Get the model to use for a named phase.
    ///
    /// Precedence (highest to lowest):
    /// 1. Phase-specific override (`[phases.<name>].model`)
    /// 2. Global default (`[defaults].model`)
    /// 3. Hard default: [`DEFAULT_MODEL`]
    ///
    /// ```toml
    /// [defaults]
    /// model = "openai:gpt-4o-mini"
    ///
    /// [phases.Phase3_CodeGeneration]
    /// model = "anthropic:claude-3-5-sonnet-latest"
    /// ```
    #[must_use]
    pub fn model_for_phase(&self, phase: &str) -> String {
        self.phases
            .get(phase)
            .and_then(|pc| pc.model.clone())
            .or_else(|| self.defaults.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Directory holding one JSON state file per run.
    #[must_use]
    pub fn state_dir(&self) -> std::path::PathBuf {
        self.defaults
            .state_dir
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from(DEFAULT_STATE_DIR))
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }
}
