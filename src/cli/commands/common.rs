//! Helpers shared by the command handlers

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::io::{IsTerminal, Read};
use std::sync::Arc;

use wizardpro_config::Config;
use wizardpro_engine::{EngineError, RunSummary, WorkflowEngine};
use wizardpro_llm::ProviderRegistry;
use wizardpro_phase_api::{RunState, RunStatus};
use wizardpro_phases::{default_sequence, required_models};
use wizardpro_store::JsonFileStore;
use wizardpro_utils::error::ConfigError;

use super::json_emit::emit_summary_json;
use crate::error::WizardError;

/// File store rooted at the configured state directory
pub fn open_store(config: &Config) -> Result<JsonFileStore> {
    let dir = Utf8PathBuf::from_path_buf(config.state_dir()).map_err(|path| {
        WizardError::Config(ConfigError::InvalidValue {
            key: "state_dir".to_string(),
            value: format!("{} is not valid UTF-8", path.display()),
        })
    })?;
    Ok(JsonFileStore::new(dir))
}

/// Engine over the default phase sequence.
///
/// Provider clients are constructed here, so a missing API key fails
/// before any run state is touched.
pub fn build_engine(config: &Config) -> Result<WorkflowEngine> {
    let store = open_store(config)?;
    let registry = ProviderRegistry::from_config(config, required_models(config))
        .map_err(WizardError::from)?;
    let sequence = default_sequence(Arc::new(registry), config)
        .context("Failed to assemble the phase sequence")?;
    Ok(WorkflowEngine::new(sequence, Arc::new(store)))
}

/// Request text from the argument, or from stdin when piped
pub fn resolve_request(request: Option<String>) -> Result<String> {
    if let Some(request) = request {
        return Ok(request);
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(WizardError::from(EngineError::EmptyRequest).into());
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("Failed to read the request from stdin")?;
    Ok(buffer)
}

/// Print where a start or resume left the run.
///
/// A run that halted in `Error` is reported after its summary, so the
/// process exits non-zero with the state already printed.
pub fn report_outcome(state: &RunState, json: bool) -> Result<()> {
    let summary = RunSummary::from_state(state);
    if json {
        println!("{}", emit_summary_json(&summary)?);
    } else {
        println!("{summary}");
        if let Some(request) = &state.pending_input {
            println!();
            println!("{}", request.prompt);
            for (i, question) in request.questions.iter().enumerate() {
                println!("  {}. {question}", i + 1);
            }
        }
    }

    match state.status {
        RunStatus::NeedsUserInput if !json => {
            println!();
            println!(
                "Answer with: wizardpro resume {} --input \"<your answers>\"",
                state.run_id
            );
            Ok(())
        }
        RunStatus::Error => Err(WizardError::RunFailed {
            run_id: state.run_id.clone(),
            phase: state.current_phase.clone(),
        }
        .into()),
        _ => Ok(()),
    }
}
