//! Start/resume logic and the main phase loop

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, error, info, warn};
use wizardpro_phase_api::{INITIAL_PHASE, LogLevel, Phase, PhaseSequence, RunState, RunStatus};
use wizardpro_store::StateStore;
use wizardpro_utils::logging::{log_phase_complete, log_phase_error, log_phase_start, phase_span};
use wizardpro_utils::run_id::{generate_run_id, sanitize_run_id};

use crate::EngineError;
use crate::active::ActiveRuns;

/// Phase name recorded on event log entries written by the engine itself
pub const ENGINE_LOG_PHASE: &str = "Engine";

/// Drives runs through a fixed [`PhaseSequence`], persisting after every step.
///
/// Phase N+1 never starts before phase N has returned and its state has
/// been saved. A failing or panicking phase turns into an `Error` status on
/// the returned state, keeping the calls it made before failing; only caller
/// mistakes and store failures are `Err`.
#[derive(Clone)]
pub struct WorkflowEngine {
    sequence: PhaseSequence,
    store: Arc<dyn StateStore>,
    pub(crate) active: ActiveRuns,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("sequence", &self.sequence)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(sequence: PhaseSequence, store: Arc<dyn StateStore>) -> Self {
        Self {
            sequence,
            store,
            active: ActiveRuns::default(),
        }
    }

    #[must_use]
    pub fn sequence(&self) -> &PhaseSequence {
        &self.sequence
    }

    /// Begin a new run.
    ///
    /// # Errors
    ///
    /// `EmptyRequest`, `InvalidRunId`, `RunAlreadyExists`, `RunInProgress`,
    /// or `Store` if state cannot be persisted.
    pub async fn start(
        &self,
        initial_request: &str,
        run_id: Option<&str>,
        wrappers: Vec<String>,
    ) -> Result<RunState, EngineError> {
        if initial_request.trim().is_empty() {
            return Err(EngineError::EmptyRequest);
        }
        let run_id = match run_id {
            Some(id) => sanitize_run_id(id)?,
            None => generate_run_id(),
        };

        let _guard = self
            .active
            .claim(&run_id)
            .ok_or_else(|| EngineError::RunInProgress(run_id.clone()))?;
        if self.store.exists(&run_id)? {
            return Err(EngineError::RunAlreadyExists(run_id));
        }

        let state = RunState::new(&run_id, initial_request).with_wrappers(wrappers);
        self.store.save(&run_id, &state)?;
        info!(
            run_id = %run_id,
            wrappers = ?state.selected_wrappers,
            "Initialized new run"
        );

        self.drive(state, 0).await
    }

    /// Continue a saved run, optionally supplying the input a paused phase
    /// asked for.
    ///
    /// # Errors
    ///
    /// `InvalidRunId`, `RunNotFound`, `RunInProgress`, or `Store`.
    pub async fn resume(
        &self,
        run_id: &str,
        user_input: Option<String>,
    ) -> Result<RunState, EngineError> {
        let run_id = sanitize_run_id(run_id)?;
        let _guard = self
            .active
            .claim(&run_id)
            .ok_or_else(|| EngineError::RunInProgress(run_id.clone()))?;

        let mut state = self
            .store
            .load(&run_id)?
            .ok_or_else(|| EngineError::RunNotFound(run_id.clone()))?;
        info!(
            run_id = %run_id,
            phase = %state.current_phase,
            status = %state.status,
            "Resuming run"
        );

        let index = match state.status {
            RunStatus::Error => {
                warn!(run_id = %run_id, "Run is in Error state; returning it unchanged");
                return Ok(state);
            }
            RunStatus::Complete => {
                info!(run_id = %run_id, "Run already complete");
                return Ok(state);
            }
            RunStatus::Pending if state.current_phase == INITIAL_PHASE => 0,
            status => match self.sequence.position(&state.current_phase) {
                Some(position) if status == RunStatus::PhaseComplete => position + 1,
                Some(position) => position,
                None => {
                    error!(
                        run_id = %run_id,
                        phase = %state.current_phase,
                        "Saved run names an unknown phase; restarting from the first phase"
                    );
                    let message = format!(
                        "Unknown phase '{}' in saved state; restarting from the first phase",
                        state.current_phase
                    );
                    state.log(ENGINE_LOG_PHASE, LogLevel::Warning, message, None);
                    0
                }
            },
        };

        if index >= self.sequence.len() {
            info!(run_id = %run_id, "Run is past the last phase; marking complete");
            state.set_status(RunStatus::Complete, None);
            state.touch();
            self.store.save(&run_id, &state)?;
            return Ok(state);
        }

        if let Some(input) = user_input {
            if state.status == RunStatus::NeedsUserInput {
                state.supply_user_input(input);
            } else {
                warn!(
                    run_id = %run_id,
                    status = %state.status,
                    "Run is not waiting for input; ignoring supplied input"
                );
                state.log(
                    ENGINE_LOG_PHASE,
                    LogLevel::Warning,
                    format!("Ignored user input supplied while the run was {}", state.status),
                    None,
                );
            }
        }

        self.drive(state, index).await
    }

    /// Load a saved run without executing anything
    ///
    /// # Errors
    ///
    /// `InvalidRunId`, `RunNotFound`, or `Store`.
    pub fn status(&self, run_id: &str) -> Result<RunState, EngineError> {
        let run_id = sanitize_run_id(run_id)?;
        self.store
            .load(&run_id)?
            .ok_or(EngineError::RunNotFound(run_id))
    }

    /// # Errors
    ///
    /// `Store` if the run ids cannot be listed.
    pub fn list(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.store.list()?)
    }

    async fn drive(&self, mut state: RunState, mut index: usize) -> Result<RunState, EngineError> {
        let run_id = state.run_id.clone();
        let total = self.sequence.len();
        info!(run_id = %run_id, start_index = index, total, "Starting phase loop");

        while let Some(phase) = self.sequence.get(index).cloned() {
            let name = phase.name().to_string();

            state.set_status(RunStatus::Running, Some(&name));
            state.touch();
            self.store.save(&run_id, &state)?;

            let snapshot = state.clone();
            log_phase_start(&run_id, &name, index);
            let started = Instant::now();
            let outcome = run_guarded(phase.as_ref(), &mut state)
                .instrument(phase_span(&run_id, &name))
                .await;
            let elapsed_ms = started.elapsed().as_millis();

            state = enforce_contract(snapshot, state, &name);
            if let Err(failure) = outcome {
                state.log(
                    &name,
                    LogLevel::Critical,
                    "Phase failed with an unhandled error",
                    Some(failure),
                );
                state.set_status(RunStatus::Error, Some(&name));
            }
            state.current_phase = name.clone();
            state.touch();
            self.store.save(&run_id, &state)?;

            match state.status {
                RunStatus::Error => {
                    let reason = state
                        .event_log
                        .last()
                        .map(|e| e.message.clone())
                        .unwrap_or_else(|| "phase reported an error".to_string());
                    log_phase_error(&run_id, &name, &reason, elapsed_ms);
                    break;
                }
                RunStatus::NeedsUserInput => {
                    log_phase_complete(&run_id, &name, state.status.as_str(), elapsed_ms);
                    info!(run_id = %run_id, phase = %name, "Run paused for user input");
                    break;
                }
                RunStatus::PhaseComplete => {
                    log_phase_complete(&run_id, &name, state.status.as_str(), elapsed_ms);
                    index += 1;
                    if index == total {
                        state.set_status(RunStatus::Complete, None);
                        state.touch();
                        self.store.save(&run_id, &state)?;
                        info!(run_id = %run_id, "All phases completed");
                    }
                }
                unexpected => {
                    let message = format!("Phase returned unexpected status '{unexpected}'");
                    log_phase_error(&run_id, &name, &message, elapsed_ms);
                    state.log(&name, LogLevel::Error, message, None);
                    state.set_status(RunStatus::Error, Some(&name));
                    state.touch();
                    self.store.save(&run_id, &state)?;
                    break;
                }
            }
        }

        info!(
            run_id = %run_id,
            status = %state.status,
            phase = %state.current_phase,
            "Phase loop halted"
        );
        Ok(state)
    }
}

/// Run one phase with a panic contained to it.
///
/// The state stays borrowed by the phase, so everything recorded up to an
/// `Err` or a panic is still there afterwards.
async fn run_guarded(phase: &dyn Phase, state: &mut RunState) -> Result<(), String> {
    match AssertUnwindSafe(phase.run(state)).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(format!(
            "phase panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Keep the returned state only if it preserved identity and history.
fn enforce_contract(snapshot: RunState, returned: RunState, phase: &str) -> RunState {
    let mut violations = Vec::new();
    if returned.run_id != snapshot.run_id {
        violations.push(format!(
            "run_id changed from '{}' to '{}'",
            snapshot.run_id, returned.run_id
        ));
    }
    if returned.call_history.len() < snapshot.call_history.len() {
        violations.push(format!(
            "call_history shrank from {} to {} entries",
            snapshot.call_history.len(),
            returned.call_history.len()
        ));
    }
    if returned.event_log.len() < snapshot.event_log.len() {
        violations.push(format!(
            "event_log shrank from {} to {} entries",
            snapshot.event_log.len(),
            returned.event_log.len()
        ));
    }
    if returned.user_feedback.len() < snapshot.user_feedback.len() {
        violations.push("user_feedback shrank".to_string());
    }

    if violations.is_empty() {
        return returned;
    }

    error!(phase, violations = ?violations, "Phase broke the run state contract");
    let mut recovered = snapshot;
    recovered.log(
        phase,
        LogLevel::Critical,
        "Phase returned a state that violates the run state contract; its changes were discarded",
        Some(violations.join("; ")),
    );
    recovered.set_status(RunStatus::Error, Some(phase));
    recovered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_accepts_growth() {
        let snapshot = RunState::new("r", "x");
        let mut returned = snapshot.clone();
        returned.log("P", LogLevel::Info, "hi", None);
        returned.mark_complete("P");

        let state = enforce_contract(snapshot, returned.clone(), "P");
        assert_eq!(state, returned);
    }

    #[test]
    fn test_contract_rejects_shrunk_log() {
        let mut snapshot = RunState::new("r", "x");
        snapshot.log("Earlier", LogLevel::Info, "kept", None);
        let mut returned = snapshot.clone();
        returned.event_log.clear();
        returned.mark_complete("P");

        let state = enforce_contract(snapshot, returned, "P");
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(state.event_log.len(), 2);
        assert_eq!(state.event_log[0].message, "kept");
    }

    #[test]
    fn test_contract_rejects_changed_run_id() {
        let snapshot = RunState::new("r", "x");
        let mut returned = snapshot.clone();
        returned.run_id = "other".to_string();

        let state = enforce_contract(snapshot, returned, "P");
        assert_eq!(state.run_id, "r");
        assert_eq!(state.status, RunStatus::Error);
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(borrowed.as_ref()), "static");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
