//! Resumable phase workflow engine
//!
//! [`WorkflowEngine`] owns an ordered [`PhaseSequence`] and a
//! [`StateStore`]. It creates or loads a run, executes phases one at a time,
//! persists after every step and uses the returned status to decide whether
//! to advance, pause for input, halt on error or finish.
//!
//! [`PhaseSequence`]: wizardpro_phase_api::PhaseSequence
//! [`StateStore`]: wizardpro_store::StateStore

mod active;
mod engine;
mod error;
mod summary;

pub use engine::{ENGINE_LOG_PHASE, WorkflowEngine};
pub use error::EngineError;
pub use summary::RunSummary;

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wizardpro_llm::GenerationResponse;
    use wizardpro_phase_api::{LogLevel, Phase, PhaseSequence, RunState, RunStatus};
    use wizardpro_store::{InMemoryStore, StateStore};

    #[derive(Clone, Copy)]
    enum Behavior {
        Complete,
        AskOnce,
        Fail,
        Panic,
        LeaveRunning,
        ShrinkHistory,
        Bail,
        CallAgainThenBail,
    }

    struct StubPhase {
        name: &'static str,
        behavior: Behavior,
        runs: AtomicUsize,
    }

    impl StubPhase {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                runs: AtomicUsize::new(0),
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Phase for StubPhase {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, state: &mut RunState) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            state.record_call(self.name, &GenerationResponse::ok("stub", "out"));
            match self.behavior {
                Behavior::Complete => state.mark_complete(self.name),
                Behavior::AskOnce => match state.take_user_response() {
                    Some(answer) => {
                        state.log(self.name, LogLevel::Info, format!("got {answer}"), None);
                        state.mark_complete(self.name);
                    }
                    None => state.request_input(self.name, "Need details", vec![]),
                },
                Behavior::Fail => state.mark_error(self.name, "stub failure", None),
                Behavior::Panic => panic!("stub exploded"),
                Behavior::LeaveRunning => {
                    state.set_status(RunStatus::Running, Some(self.name));
                }
                Behavior::ShrinkHistory => {
                    state.call_history.clear();
                    state.mark_complete(self.name);
                }
                Behavior::Bail => bail!("catastrophic"),
                Behavior::CallAgainThenBail => {
                    state.record_call(self.name, &GenerationResponse::ok("stub", "second"));
                    bail!("lost connection to the workspace")
                }
            }
            Ok(())
        }
    }

    fn engine(phases: Vec<Arc<StubPhase>>) -> (WorkflowEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let phases: Vec<Arc<dyn Phase>> = phases
            .into_iter()
            .map(|p| p as Arc<dyn Phase>)
            .collect();
        let sequence = PhaseSequence::new(phases).unwrap();
        (
            WorkflowEngine::new(sequence, store.clone() as Arc<dyn StateStore>),
            store,
        )
    }

    #[tokio::test]
    async fn test_pause_and_resume_to_complete() {
        let a = StubPhase::new("A", Behavior::Complete);
        let b = StubPhase::new("B", Behavior::AskOnce);
        let c = StubPhase::new("C", Behavior::Complete);
        let (engine, store) = engine(vec![a.clone(), b.clone(), c.clone()]);

        let paused = engine
            .start("build it", Some("proj_three"), vec![])
            .await
            .unwrap();
        assert_eq!(paused.status, RunStatus::NeedsUserInput);
        assert_eq!(paused.current_phase, "B");
        assert_eq!(c.runs(), 0);
        assert_eq!(store.load("proj_three").unwrap().unwrap(), paused);

        let done = engine
            .resume("proj_three", Some("use sqlite".into()))
            .await
            .unwrap();
        assert_eq!(done.status, RunStatus::Complete);
        assert_eq!(a.runs(), 1);
        assert_eq!(b.runs(), 2);
        assert_eq!(c.runs(), 1);
        assert_eq!(done.call_history.len(), 4);
        assert_eq!(done.user_feedback.len(), 1);
        assert!(done.pending_input.is_none());
        assert!(done.latest_user_response.is_none());
    }

    #[tokio::test]
    async fn test_resume_after_phase_complete_advances() {
        let a = StubPhase::new("A", Behavior::Complete);
        let b = StubPhase::new("B", Behavior::Complete);
        let (engine, store) = engine(vec![a.clone(), b.clone()]);

        let mut state = RunState::new("proj_adv", "x");
        state.mark_complete("A");
        store.save("proj_adv", &state).unwrap();

        let done = engine.resume("proj_adv", None).await.unwrap();
        assert_eq!(a.runs(), 0);
        assert_eq!(b.runs(), 1);
        assert_eq!(done.status, RunStatus::Complete);
    }

    #[tokio::test]
    async fn test_resume_interrupted_running_reenters_phase() {
        let a = StubPhase::new("A", Behavior::Complete);
        let b = StubPhase::new("B", Behavior::Complete);
        let (engine, store) = engine(vec![a.clone(), b.clone()]);

        let mut state = RunState::new("proj_crash", "x");
        state.set_status(RunStatus::Running, Some("B"));
        store.save("proj_crash", &state).unwrap();

        engine.resume("proj_crash", None).await.unwrap();
        assert_eq!(a.runs(), 0);
        assert_eq!(b.runs(), 1);
    }

    #[tokio::test]
    async fn test_error_phase_is_not_resumed() {
        let a = StubPhase::new("A", Behavior::Fail);
        let b = StubPhase::new("B", Behavior::Complete);
        let (engine, _store) = engine(vec![a.clone(), b.clone()]);

        let failed = engine.start("x", Some("proj_err"), vec![]).await.unwrap();
        assert_eq!(failed.status, RunStatus::Error);
        assert_eq!(failed.current_phase, "A");

        let again = engine.resume("proj_err", None).await.unwrap();
        assert_eq!(again, failed);
        assert_eq!(a.runs(), 1);
        assert_eq!(b.runs(), 0);
    }

    #[tokio::test]
    async fn test_panicking_phase_becomes_error() {
        let a = StubPhase::new("A", Behavior::Complete);
        let boom = StubPhase::new("Boom", Behavior::Panic);
        let (engine, store) = engine(vec![a, boom]);

        let state = engine.start("x", Some("proj_panic"), vec![]).await.unwrap();
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(state.current_phase, "Boom");
        // Calls made by the panicking phase are kept along with earlier work
        assert_eq!(state.call_history.len(), 2);
        assert_eq!(state.call_history[1].phase, "Boom");
        let last = state.event_log.last().unwrap();
        assert_eq!(last.level, LogLevel::Critical);
        assert_eq!(last.phase, "Boom");
        assert!(last.details.as_deref().unwrap().contains("stub exploded"));
        assert_eq!(store.load("proj_panic").unwrap().unwrap(), state);
    }

    #[tokio::test]
    async fn test_err_from_phase_becomes_error() {
        let (engine, _store) = engine(vec![StubPhase::new("A", Behavior::Bail)]);
        let state = engine.start("x", Some("proj_bail"), vec![]).await.unwrap();
        assert_eq!(state.status, RunStatus::Error);
        assert!(
            state.event_log[0]
                .details
                .as_deref()
                .unwrap()
                .contains("catastrophic")
        );
    }

    #[tokio::test]
    async fn test_calls_before_err_are_persisted() {
        let a = StubPhase::new("A", Behavior::Complete);
        let b = StubPhase::new("B", Behavior::CallAgainThenBail);
        let (engine, store) = engine(vec![a, b]);

        let state = engine.start("x", Some("proj_partial"), vec![]).await.unwrap();
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(state.current_phase, "B");

        let saved = store.load("proj_partial").unwrap().unwrap();
        assert_eq!(saved, state);
        let phases: Vec<&str> = saved.call_history.iter().map(|c| c.phase.as_str()).collect();
        assert_eq!(phases, ["A", "B", "B"]);
        let last = saved.event_log.last().unwrap();
        assert_eq!(last.level, LogLevel::Critical);
        assert!(
            last.details
                .as_deref()
                .unwrap()
                .contains("lost connection to the workspace")
        );
    }

    #[tokio::test]
    async fn test_input_ignored_unless_paused() {
        let a = StubPhase::new("A", Behavior::Complete);
        let b = StubPhase::new("B", Behavior::Complete);
        let (engine, store) = engine(vec![a, b.clone()]);

        let mut state = RunState::new("proj_extra", "x");
        state.mark_complete("A");
        store.save("proj_extra", &state).unwrap();

        let done = engine
            .resume("proj_extra", Some("unused answer".into()))
            .await
            .unwrap();
        assert_eq!(done.status, RunStatus::Complete);
        assert_eq!(b.runs(), 1);
        assert!(done.latest_user_response.is_none());
        assert!(done.user_feedback.is_empty());
        assert!(done.event_log.iter().any(|e| {
            e.phase == ENGINE_LOG_PHASE
                && e.level == LogLevel::Warning
                && e.message.contains("Ignored user input")
        }));
    }

    #[tokio::test]
    async fn test_running_status_returned_is_contract_violation() {
        let a = StubPhase::new("A", Behavior::LeaveRunning);
        let b = StubPhase::new("B", Behavior::Complete);
        let (engine, _store) = engine(vec![a, b.clone()]);

        let state = engine.start("x", Some("proj_run"), vec![]).await.unwrap();
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(b.runs(), 0);
        assert!(
            state
                .event_log
                .iter()
                .any(|e| e.message.contains("unexpected status 'Running'"))
        );
    }

    #[tokio::test]
    async fn test_shrunk_history_is_discarded() {
        let a = StubPhase::new("A", Behavior::Complete);
        let b = StubPhase::new("B", Behavior::ShrinkHistory);
        let (engine, _store) = engine(vec![a, b]);

        let state = engine.start("x", Some("proj_shrink"), vec![]).await.unwrap();
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(state.call_history.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_phase_restarts_from_first() {
        let a = StubPhase::new("A", Behavior::Complete);
        let (engine, store) = engine(vec![a.clone()]);

        let mut state = RunState::new("proj_unknown", "x");
        state.mark_complete("Removed");
        store.save("proj_unknown", &state).unwrap();

        let done = engine.resume("proj_unknown", None).await.unwrap();
        assert_eq!(a.runs(), 1);
        assert_eq!(done.status, RunStatus::Complete);
        assert!(done.event_log.iter().any(|e| {
            e.phase == ENGINE_LOG_PHASE
                && e.level == LogLevel::Warning
                && e.message.contains("Removed")
        }));
    }

    #[tokio::test]
    async fn test_complete_run_is_returned_unchanged() {
        let a = StubPhase::new("A", Behavior::Complete);
        let (engine, _store) = engine(vec![a.clone()]);

        let done = engine.start("x", Some("proj_done"), vec![]).await.unwrap();
        let again = engine.resume("proj_done", None).await.unwrap();
        assert_eq!(again, done);
        assert_eq!(a.runs(), 1);
    }

    #[tokio::test]
    async fn test_phase_complete_on_last_phase_marks_complete_on_resume() {
        let a = StubPhase::new("A", Behavior::Complete);
        let (engine, store) = engine(vec![a.clone()]);

        let mut state = RunState::new("proj_tail", "x");
        state.mark_complete("A");
        store.save("proj_tail", &state).unwrap();

        let done = engine.resume("proj_tail", None).await.unwrap();
        assert_eq!(done.status, RunStatus::Complete);
        assert_eq!(a.runs(), 0);
        assert_eq!(
            store.load("proj_tail").unwrap().unwrap().status,
            RunStatus::Complete
        );
    }

    #[tokio::test]
    async fn test_caller_errors() {
        let (engine, _store) = engine(vec![StubPhase::new("A", Behavior::Complete)]);

        assert!(matches!(
            engine.start("   ", None, vec![]).await,
            Err(EngineError::EmptyRequest)
        ));
        assert!(matches!(
            engine.resume("proj_nope", None).await,
            Err(EngineError::RunNotFound(_))
        ));
        assert!(matches!(
            engine.status("proj_nope"),
            Err(EngineError::RunNotFound(_))
        ));

        engine.start("x", Some("proj_dup"), vec![]).await.unwrap();
        assert!(matches!(
            engine.start("x", Some("proj_dup"), vec![]).await,
            Err(EngineError::RunAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_run_in_progress_is_rejected() {
        let (engine, _store) = engine(vec![StubPhase::new("A", Behavior::Complete)]);
        let _held = engine.active.claim("proj_busy").unwrap();

        assert!(matches!(
            engine.start("x", Some("proj_busy"), vec![]).await,
            Err(EngineError::RunInProgress(_))
        ));
        assert!(matches!(
            engine.resume("proj_busy", None).await,
            Err(EngineError::RunInProgress(_))
        ));
    }

    #[tokio::test]
    async fn test_generated_id_and_wrappers_are_kept() {
        let (engine, _store) = engine(vec![StubPhase::new("A", Behavior::Complete)]);
        let state = engine
            .start("x", None, vec!["python".into()])
            .await
            .unwrap();
        assert!(state.run_id.starts_with("proj_"));
        assert_eq!(state.selected_wrappers, vec!["python"]);
        assert_eq!(engine.list().unwrap(), vec![state.run_id.clone()]);
    }
}
