use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use wizardpro_phase_api::RunState;

use crate::{StateStore, StoreError, check_key, decode};

/// Process-local store holding serialized JSON per run.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    runs: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored JSON for a run directly
    pub fn put_raw(&self, run_id: &str, json: impl Into<String>) {
        self.lock().insert(run_id.to_string(), json.into());
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.runs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StateStore for InMemoryStore {
    fn save(&self, run_id: &str, state: &RunState) -> Result<(), StoreError> {
        check_key(run_id)?;
        let json = serde_json::to_string(state)?;
        self.lock().insert(run_id.to_string(), json);
        Ok(())
    }

    fn load(&self, run_id: &str) -> Result<Option<RunState>, StoreError> {
        check_key(run_id)?;
        let json = self.lock().get(run_id).cloned();
        json.map(|json| decode(run_id, &json)).transpose()
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizardpro_phase_api::RunStatus;

    #[test]
    fn test_memory_store_round_trip() {
        let store = InMemoryStore::new();
        let mut state = RunState::new("proj_m", "x");
        state.set_status(RunStatus::NeedsUserInput, Some("Phase1_Requirements"));
        store.save("proj_m", &state).unwrap();

        assert_eq!(store.load("proj_m").unwrap(), Some(state));
        assert_eq!(store.list().unwrap(), vec!["proj_m"]);
        assert!(store.load("proj_other").unwrap().is_none());
    }

    #[test]
    fn test_raw_garbage_is_corrupt() {
        let store = InMemoryStore::new();
        store.put_raw("proj_g", "[]");
        assert!(matches!(
            store.load("proj_g"),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
