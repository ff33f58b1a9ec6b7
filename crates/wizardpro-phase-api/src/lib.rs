//! Phase contract for wizardpro workflows
//!
//! This crate provides the shared contract between the engine and phase
//! implementations: the persisted [`RunState`], its [`RunStatus`], and the
//! [`Phase`] trait. It has no knowledge of how phases are sequenced or
//! where state is stored.

use anyhow::{Result, ensure};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

mod state;

pub use state::{
    CallRecord, INITIAL_PHASE, InputRequest, LogEntry, LogLevel, RunState, RunStatus,
    UserFeedback, artifacts,
};

/// Core trait that all workflow phases must implement
///
/// A phase updates the run state in place and leaves `status` set to
/// `PhaseComplete`, `NeedsUserInput` or `Error`. Ordinary failures (a failed
/// generation call, unparsable output) belong in the state; `Err` is
/// reserved for failures the phase cannot describe. Whatever the phase
/// recorded before returning `Err` is kept.
#[async_trait]
pub trait Phase: Send + Sync {
    /// Unique name, used as the resume key stored in `current_phase`
    fn name(&self) -> &str;

    async fn run(&self, state: &mut RunState) -> Result<()>;
}

/// Ordered, statically declared list of phases
#[derive(Clone)]
pub struct PhaseSequence {
    phases: Vec<Arc<dyn Phase>>,
}

impl std::fmt::Debug for PhaseSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PhaseSequence {
    /// # Errors
    ///
    /// Fails if the list is empty or two phases share a name.
    pub fn new(phases: Vec<Arc<dyn Phase>>) -> Result<Self> {
        ensure!(!phases.is_empty(), "phase sequence must not be empty");
        let mut seen = HashSet::new();
        for phase in &phases {
            ensure!(
                seen.insert(phase.name().to_string()),
                "duplicate phase name '{}' in sequence",
                phase.name()
            );
        }
        Ok(Self { phases })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Phase>> {
        self.phases.get(index)
    }

    /// Index of the phase with this name
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(|p| p.name())
    }
}
