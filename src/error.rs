//! Top-level error type for the `wizardpro` binary
//!
//! Each workspace crate owns its error enum; [`WizardError`] gathers them
//! so the CLI can render one report and pick one exit code.

use thiserror::Error;

use wizardpro_engine::EngineError;
use wizardpro_llm::LlmError;
use wizardpro_store::StoreError;
use wizardpro_utils::error::{ConfigError, ErrorCategory, UserFriendlyError};
use wizardpro_utils::exit_codes::ExitCode;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The run halted in `Error`; its state is already persisted.
    #[error("Run '{run_id}' halted with an error in {phase}")]
    RunFailed { run_id: String, phase: String },
}

impl WizardError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Llm(_) => ExitCode::CLI_ARGS,
            Self::Engine(e) => e.exit_code(),
            Self::Store(_) | Self::RunFailed { .. } => ExitCode::INTERNAL,
        }
    }
}

impl UserFriendlyError for WizardError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Engine(e) => e.user_message(),
            Self::Store(e) => e.user_message(),
            Self::RunFailed { run_id, phase } => {
                format!("Run '{run_id}' stopped because {phase} failed")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Engine(e) => e.context(),
            Self::Store(e) => e.context(),
            Self::RunFailed { .. } => Some(
                "Runs in Error are kept for inspection and are not resumed.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Engine(e) => e.suggestions(),
            Self::Store(e) => e.suggestions(),
            Self::RunFailed { run_id, .. } => vec![
                format!("Inspect the event log with 'wizardpro status {run_id} --events'"),
                "Start a new run once the cause is fixed".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Engine(e) => e.category(),
            Self::Store(e) => e.category(),
            Self::RunFailed { .. } => ErrorCategory::PhaseExecution,
        }
    }
}
