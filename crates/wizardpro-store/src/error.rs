use camino::Utf8PathBuf;
use thiserror::Error;
use wizardpro_utils::error::{ErrorCategory, UserFriendlyError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize run state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored state for run '{run_id}' is corrupt: {reason}")]
    Corrupt { run_id: String, reason: String },

    #[error("'{0}' is not a valid storage key")]
    InvalidKey(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        match self {
            Self::Io { path, source } => format!("Could not access run state at {path}: {source}"),
            Self::Serialization(e) => format!("Run state could not be encoded as JSON: {e}"),
            Self::Corrupt { run_id, reason } => {
                format!("The saved state for run '{run_id}' cannot be read: {reason}")
            }
            Self::InvalidKey(key) => format!("'{key}' cannot be used as a run id"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Corrupt { .. } => {
                Some("State files are plain JSON and may have been edited by hand.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Io { .. } => vec![
                "Check that the state directory exists and is writable".to_string(),
                "Set [defaults].state_dir or pass --state-dir".to_string(),
            ],
            Self::Corrupt { run_id, .. } => vec![format!(
                "Inspect or remove {run_id}.json in the state directory"
            )],
            Self::InvalidKey(_) => {
                vec!["Use only letters, digits, '.', '_' and '-' in run ids".to_string()]
            }
            Self::Serialization(_) => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidKey(_) => ErrorCategory::Validation,
            _ => ErrorCategory::Persistence,
        }
    }
}
