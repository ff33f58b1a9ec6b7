use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Run ids currently being driven by one engine
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveRuns {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl ActiveRuns {
    /// Claim `run_id`; `None` if another task already holds it
    pub fn claim(&self, run_id: &str) -> Option<ActiveRunGuard> {
        if self.lock().insert(run_id.to_string()) {
            Some(ActiveRunGuard {
                ids: Arc::clone(&self.ids),
                run_id: run_id.to_string(),
            })
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn is_active(&self, run_id: &str) -> bool {
        self.lock().contains(run_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the claim on drop
#[derive(Debug)]
pub(crate) struct ActiveRunGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    run_id: String,
}

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive_until_dropped() {
        let active = ActiveRuns::default();
        let guard = active.claim("proj_a").unwrap();
        assert!(active.claim("proj_a").is_none());
        assert!(active.claim("proj_b").is_some());
        assert!(active.is_active("proj_a"));

        drop(guard);
        assert!(!active.is_active("proj_a"));
        assert!(active.claim("proj_a").is_some());
    }
}
