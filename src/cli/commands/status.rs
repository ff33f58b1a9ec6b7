//! Status command implementation
//!
//! Handles `wizardpro status`. Reads the store only; nothing is executed.

use anyhow::Result;

use wizardpro_config::Config;
use wizardpro_engine::{EngineError, RunSummary};
use wizardpro_phase_api::{LogEntry, RunState};
use wizardpro_store::StateStore;
use wizardpro_utils::run_id::sanitize_run_id;

use super::common::open_store;
use super::json_emit::{StatusJsonOutput, emit_status_json};
use crate::error::WizardError;

/// Execute the status command
pub fn execute_status_command(run_id: &str, events: bool, json: bool, config: &Config) -> Result<()> {
    let state = load_run(run_id, config)?;
    let summary = RunSummary::from_state(&state);

    if json {
        let output = StatusJsonOutput {
            summary,
            events: events.then_some(state.event_log.as_slice()),
        };
        println!("{}", emit_status_json(&output)?);
        return Ok(());
    }

    println!("{summary}");
    if let Some(request) = &state.pending_input {
        for question in &request.questions {
            println!("  - {question}");
        }
    }
    if events {
        println!();
        println!("Event log:");
        if state.event_log.is_empty() {
            println!("  (empty)");
        }
        for entry in &state.event_log {
            println!("  {}", format_entry(entry));
        }
    }
    Ok(())
}

fn load_run(run_id: &str, config: &Config) -> Result<RunState> {
    let run_id = sanitize_run_id(run_id).map_err(|e| WizardError::from(EngineError::from(e)))?;
    let store = open_store(config)?;
    match store.load(&run_id).map_err(WizardError::from)? {
        Some(state) => Ok(state),
        None => Err(WizardError::from(EngineError::RunNotFound(run_id)).into()),
    }
}

fn format_entry(entry: &LogEntry) -> String {
    let mut line = format!(
        "{} {:<8} {}: {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.to_string(),
        entry.phase,
        entry.message
    );
    if let Some(details) = &entry.details {
        for detail in details.lines() {
            line.push_str("\n      ");
            line.push_str(detail);
        }
    }
    line
}
