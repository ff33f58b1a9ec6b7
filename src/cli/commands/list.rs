//! List command implementation
//!
//! Handles `wizardpro list`.

use anyhow::Result;
use tracing::warn;

use wizardpro_config::Config;
use wizardpro_engine::RunSummary;
use wizardpro_store::StateStore;

use super::common::open_store;
use super::json_emit::emit_list_json;
use crate::error::WizardError;

/// Execute the list command
pub fn execute_list_command(json: bool, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let mut summaries = Vec::new();
    for run_id in store.list().map_err(WizardError::from)? {
        match store.load(&run_id) {
            Ok(Some(state)) => summaries.push(RunSummary::from_state(&state)),
            Ok(None) => {}
            Err(e) => warn!(run_id = %run_id, error = %e, "Skipping unreadable run"),
        }
    }

    if json {
        println!("{}", emit_list_json(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No runs found in {}", store.dir());
        return Ok(());
    }
    let width = summaries.iter().map(|s| s.run_id.len()).max().unwrap_or(0);
    for summary in &summaries {
        println!(
            "{:<width$}  {:<14}  {:<22}  {}",
            summary.run_id,
            summary.status.as_str(),
            summary.current_phase,
            summary.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}
