use thiserror::Error;
use wizardpro_store::StoreError;
use wizardpro_utils::error::{ErrorCategory, UserFriendlyError};
use wizardpro_utils::exit_codes::ExitCode;
use wizardpro_utils::run_id::RunIdError;

/// Caller errors from [`crate::WorkflowEngine`].
///
/// Phase failures never surface here; they end up in the run state as
/// `Error`. These variants describe requests the engine refused to act on.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("An initial request is required to start a run")]
    EmptyRequest,

    #[error("Invalid run id: {0}")]
    InvalidRunId(#[from] RunIdError),

    #[error("No saved state for run '{0}'")]
    RunNotFound(String),

    #[error("Run '{0}' already exists")]
    RunAlreadyExists(String),

    #[error("Run '{0}' is already in progress")]
    RunInProgress(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::EmptyRequest | Self::InvalidRunId(_) => ExitCode::CLI_ARGS,
            Self::RunNotFound(_) => ExitCode::RUN_NOT_FOUND,
            Self::RunAlreadyExists(_) | Self::RunInProgress(_) => ExitCode::RUN_BUSY,
            Self::Store(_) => ExitCode::INTERNAL,
        }
    }
}

impl UserFriendlyError for EngineError {
    fn user_message(&self) -> String {
        match self {
            Self::EmptyRequest => "Cannot start a run without an initial request".to_string(),
            Self::InvalidRunId(e) => e.user_message(),
            Self::RunNotFound(id) => format!("There is no saved run named '{id}'"),
            Self::RunAlreadyExists(id) => format!("A run named '{id}' already exists"),
            Self::RunInProgress(id) => format!("Run '{id}' is already being executed"),
            Self::Store(e) => e.user_message(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidRunId(e) => e.context(),
            Self::Store(e) => e.context(),
            Self::RunAlreadyExists(_) => {
                Some("Starting a run never overwrites saved state.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyRequest => vec!["Pass the request text: wizardpro start \"<request>\"".to_string()],
            Self::InvalidRunId(e) => e.suggestions(),
            Self::RunNotFound(_) => vec!["Run 'wizardpro list' to see saved runs".to_string()],
            Self::RunAlreadyExists(id) => vec![
                format!("Continue it with 'wizardpro resume {id}'"),
                "Or omit --run-id to generate a fresh id".to_string(),
            ],
            Self::RunInProgress(_) => {
                vec!["Wait for the current invocation to halt, then resume".to_string()]
            }
            Self::Store(e) => e.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyRequest | Self::InvalidRunId(_) => ErrorCategory::Validation,
            Self::RunNotFound(_) | Self::Store(_) => ErrorCategory::Persistence,
            Self::RunAlreadyExists(_) | Self::RunInProgress(_) => ErrorCategory::Concurrency,
        }
    }
}
