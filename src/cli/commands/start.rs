//! Start command implementation
//!
//! Handles `wizardpro start`.

use anyhow::Result;
use tracing::info;

use wizardpro_config::Config;

use super::common::{build_engine, report_outcome, resolve_request};
use crate::error::WizardError;

/// Execute the start command
pub async fn execute_start_command(
    request: Option<String>,
    run_id: Option<&str>,
    wrappers: Vec<String>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let request = resolve_request(request)?;
    let engine = build_engine(config)?;

    let state = engine
        .start(&request, run_id, wrappers)
        .await
        .map_err(WizardError::from)?;
    info!(run_id = %state.run_id, status = %state.status, "Run halted");

    report_outcome(&state, json)
}
