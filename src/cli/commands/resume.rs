//! Resume command implementation
//!
//! Handles `wizardpro resume`.

use anyhow::Result;
use tracing::{info, warn};

use wizardpro_config::Config;
use wizardpro_engine::EngineError;
use wizardpro_phase_api::RunStatus;
use wizardpro_store::StateStore;
use wizardpro_utils::run_id::sanitize_run_id;

use super::common::{build_engine, open_store, report_outcome};
use crate::error::WizardError;

/// Execute the resume command
///
/// The run is looked up before any provider client is built, so a typo
/// in the run id is reported as such even when no API key is set. Runs in
/// `Error` or `Complete` are reported straight from the store.
pub async fn execute_resume_command(
    run_id: &str,
    input: Option<String>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let run_id = sanitize_run_id(run_id).map_err(|e| WizardError::from(EngineError::from(e)))?;
    let store = open_store(config)?;
    let Some(saved) = store.load(&run_id).map_err(WizardError::from)? else {
        return Err(WizardError::from(EngineError::RunNotFound(run_id)).into());
    };
    if matches!(saved.status, RunStatus::Error | RunStatus::Complete) {
        if input.is_some() {
            warn!(run_id = %run_id, status = %saved.status, "Run is finished; ignoring --input");
        }
        info!(run_id = %run_id, status = %saved.status, "Run has nothing left to execute");
        return report_outcome(&saved, json);
    }

    let engine = build_engine(config)?;
    let state = engine
        .resume(&run_id, input)
        .await
        .map_err(WizardError::from)?;
    info!(run_id = %state.run_id, status = %state.status, "Run halted");

    report_outcome(&state, json)
}
