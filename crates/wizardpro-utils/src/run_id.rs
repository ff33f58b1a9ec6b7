//! Run identifier generation and sanitization
//!
//! Run ids double as storage keys (one JSON file per run), so anything a
//! caller hands us must be made safe for use as a file name.

use crate::error::{ErrorCategory, UserFriendlyError};
use chrono::Utc;
use unicode_normalization::UnicodeNormalization;

/// Error type for run id validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunIdError {
    #[error("Run ID is empty after sanitization")]
    Empty,

    #[error("Run ID contains only invalid characters")]
    OnlyInvalidCharacters,
}

impl UserFriendlyError for RunIdError {
    fn user_message(&self) -> String {
        match self {
            Self::Empty => "The run ID is empty".to_string(),
            Self::OnlyInvalidCharacters => {
                "The run ID contains no alphanumeric characters, dots, or dashes".to_string()
            }
        }
    }

    fn context(&self) -> Option<String> {
        Some("Run IDs name the persisted state file, so only [A-Za-z0-9._-] is kept; everything else becomes an underscore.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        vec![
            "Use alphanumeric characters, dots, dashes, or underscores".to_string(),
            "Example: proj_checkout-api, billing.v2".to_string(),
            "Omit --run-id to have one generated".to_string(),
        ]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

/// Generate a fresh run id of the form `proj_<8 hex>_<YYYYMMDD>`.
#[must_use]
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("proj_{}_{}", &uuid[..8], Utc::now().format("%Y%m%d"))
}

/// Sanitizes a caller-supplied run id for use as a storage key.
///
/// Applies NFKC normalization, keeps only `[A-Za-z0-9._-]`, replaces
/// everything else (and any `..`) with underscores, and rejects ids that
/// end up empty or made only of underscores.
///
/// ```
/// use wizardpro_utils::run_id::sanitize_run_id;
///
/// assert_eq!(sanitize_run_id("my-run_1").unwrap(), "my-run_1");
/// assert_eq!(sanitize_run_id("my run!").unwrap(), "my_run_");
/// assert_eq!(sanitize_run_id("ｍｙ－ｒｕｎ").unwrap(), "my-run");
/// ```
pub fn sanitize_run_id(id: &str) -> Result<String, RunIdError> {
    let normalized: String = id.trim().nfkc().collect();

    let mut sanitized: String = normalized
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "__");
    }

    if sanitized.is_empty() {
        return Err(RunIdError::Empty);
    }

    let has_meaningful_content = sanitized
        .chars()
        .any(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !has_meaningful_content {
        return Err(RunIdError::OnlyInvalidCharacters);
    }

    if sanitized != id {
        tracing::warn!(original = %id, sanitized = %sanitized, "Run ID sanitized");
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generated_run_id_shape() {
        let id = generate_run_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3, "unexpected id: {id}");
        assert_eq!(parts[0], "proj");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generated_run_ids_are_unique() {
        assert_ne!(generate_run_id(), generate_run_id());
    }

    #[test]
    fn test_valid_run_id_unchanged() {
        assert_eq!(sanitize_run_id("proj_1a2b3c4d_20260101").unwrap(), "proj_1a2b3c4d_20260101");
        assert_eq!(sanitize_run_id("billing.v2").unwrap(), "billing.v2");
    }

    #[test]
    fn test_path_traversal_neutralized() {
        assert_eq!(sanitize_run_id("../etc/passwd").unwrap(), "___etc_passwd");
        assert_eq!(sanitize_run_id("a/../b").unwrap(), "a____b");
    }

    #[test]
    fn test_rejects_empty_and_meaningless() {
        assert_eq!(sanitize_run_id(""), Err(RunIdError::Empty));
        assert_eq!(sanitize_run_id("   "), Err(RunIdError::Empty));
        assert_eq!(sanitize_run_id("!!!"), Err(RunIdError::OnlyInvalidCharacters));
    }

    #[test]
    fn test_run_id_error_user_friendly() {
        let err = RunIdError::OnlyInvalidCharacters;
        assert!(!err.user_message().is_empty());
        assert!(err.context().is_some());
        assert!(err.suggestions().iter().any(|s| s.contains("Example:")));
    }

    proptest! {
        #[test]
        fn prop_sanitized_ids_are_filename_safe(raw in "\\PC{1,40}") {
            if let Ok(id) = sanitize_run_id(&raw) {
                prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'));
                prop_assert!(!id.contains(".."));
            }
        }
    }
}
