//! Durable persistence of [`RunState`] keyed by run id
//!
//! [`JsonFileStore`] keeps one pretty-printed JSON file per run and
//! replaces it atomically on every save. [`InMemoryStore`] serializes to
//! the same JSON, which keeps tests honest about what survives a reload.

mod error;
mod file_store;
mod memory_store;

pub use error::StoreError;
pub use file_store::JsonFileStore;
pub use memory_store::InMemoryStore;

use wizardpro_phase_api::RunState;

/// Last-writer-wins key-value persistence for run state.
///
/// Each `save` is atomic per key: a concurrent or later `load` sees either
/// the previous state or the new one.
pub trait StateStore: Send + Sync {
    fn save(&self, run_id: &str, state: &RunState) -> Result<(), StoreError>;

    /// `Ok(None)` when no state exists for `run_id`
    fn load(&self, run_id: &str) -> Result<Option<RunState>, StoreError>;

    /// All stored run ids, sorted
    fn list(&self) -> Result<Vec<String>, StoreError>;

    fn exists(&self, run_id: &str) -> Result<bool, StoreError> {
        Ok(self.load(run_id)?.is_some())
    }
}

/// Reject keys that would not survive as a file name.
pub(crate) fn check_key(run_id: &str) -> Result<(), StoreError> {
    match wizardpro_utils::run_id::sanitize_run_id(run_id) {
        Ok(clean) if clean == run_id && !run_id.starts_with('.') => Ok(()),
        _ => Err(StoreError::InvalidKey(run_id.to_string())),
    }
}

pub(crate) fn decode(run_id: &str, json: &str) -> Result<RunState, StoreError> {
    let state: RunState = serde_json::from_str(json).map_err(|e| StoreError::Corrupt {
        run_id: run_id.to_string(),
        reason: e.to_string(),
    })?;
    if state.run_id != run_id {
        return Err(StoreError::Corrupt {
            run_id: run_id.to_string(),
            reason: format!("file contains state for run '{}'", state.run_id),
        });
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("proj_1234abcd_20260101").is_ok());
        assert!(check_key("../escape").is_err());
        assert!(check_key("a/b").is_err());
        assert!(check_key(".hidden").is_err());
        assert!(check_key("").is_err());
    }

    #[test]
    fn test_decode_rejects_mismatched_id() {
        let state = RunState::new("one", "x");
        let json = serde_json::to_string(&state).unwrap();
        let err = decode("two", &json).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
