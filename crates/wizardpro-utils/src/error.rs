use std::path::PathBuf;
use thiserror::Error;

/// Trait for errors that can be rendered for a human at the CLI boundary.
///
/// Every caller-facing error type in the workspace implements this so the
/// CLI can print a consistent report: message, optional context, and a
/// list of concrete suggestions.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    PhaseExecution,
    Generation,
    Persistence,
    Concurrency,
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::PhaseExecution => "phase execution",
            Self::Generation => "generation",
            Self::Persistence => "persistence",
            Self::Concurrency => "concurrency",
            Self::Validation => "validation",
        };
        f.write_str(label)
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration key: {key}")]
    MissingRequired { key: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("The configuration file could not be parsed: {msg}"),
            Self::NotFound { path } => {
                format!("No configuration file exists at {}", path.display())
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration key '{key}' has an invalid value: {value}")
            }
            Self::MissingRequired { key } => {
                format!("Configuration key '{key}' is required but was not set")
            }
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Configuration is resolved with precedence CLI flags > config file > built-in defaults."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .wizardpro/config.toml".to_string(),
                "Remove unknown sections or keys".to_string(),
            ],
            Self::NotFound { .. } => vec![
                "Pass an existing file with --config".to_string(),
                "Or omit --config to use discovery".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![format!(
                "Fix the value of '{key}' in the config file or on the command line"
            )],
            Self::MissingRequired { key } => vec![format!("Set '{key}' in the config file")],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Render a full report for any user-facing error.
pub fn render_report(err: &dyn UserFriendlyError) -> String {
    let mut report = format!("Error ({}): {}", err.category(), err.user_message());
    if let Some(context) = err.context() {
        report.push_str("\n\n");
        report.push_str(&context);
    }
    let suggestions = err.suggestions();
    if !suggestions.is_empty() {
        report.push_str("\n\nSuggestions:");
        for suggestion in suggestions {
            report.push_str("\n  - ");
            report.push_str(&suggestion);
        }
    }
    report
}
