//! wizardpro - resumable multi-phase LLM project pipeline
//!
//! A free-text project request flows through five phases (requirements,
//! architecture, code generation, testing, deployment). Each phase calls a
//! generation service through a retrying executor, and the run state is
//! persisted after every phase so a paused, failed or interrupted run can
//! be inspected and resumed.
//!
//! wizardpro can be used in two ways:
//! - **CLI**: `wizardpro start|resume|status|list`
//! - **Library**: build a [`WorkflowEngine`] over any [`StateStore`] and
//!   [`PhaseSequence`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wizardpro::{
//!     Config, InMemoryStore, ProviderRegistry, WorkflowEngine, default_sequence, required_models,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::builder().model("openai:gpt-4o-mini").build()?;
//! let registry = ProviderRegistry::from_config(&config, required_models(&config))?;
//! let sequence = default_sequence(Arc::new(registry), &config)?;
//! let engine = WorkflowEngine::new(sequence, Arc::new(InMemoryStore::new()));
//!
//! let state = engine.start("A CLI todo manager", None, Vec::new()).await?;
//! println!("{} stopped at {} ({})", state.run_id, state.current_phase, state.status);
//! # Ok(())
//! # }
//! ```
//!
//! Custom phases implement [`Phase`] and are sequenced with
//! [`PhaseSequence::new`].

pub mod cli;
pub mod error;

pub use error::WizardError;

pub use wizardpro_config::{CliArgs, Config, ConfigBuilder};
pub use wizardpro_engine::{EngineError, RunSummary, WorkflowEngine};
pub use wizardpro_llm::{
    CallError, GenerationClient, GenerationRequest, GenerationResponse, LlmError,
    ProviderRegistry, ResilientExecutor, RetryPolicy,
};
pub use wizardpro_phase_api::{LogLevel, Phase, PhaseSequence, RunState, RunStatus, artifacts};
pub use wizardpro_phases::{PHASE_NAMES, default_sequence, required_models};
pub use wizardpro_store::{InMemoryStore, JsonFileStore, StateStore, StoreError};
pub use wizardpro_utils::exit_codes::ExitCode;
