//! JSON emit functions for CLI output

use anyhow::{Context, Result};
use serde::Serialize;

use wizardpro_engine::RunSummary;
use wizardpro_phase_api::LogEntry;

/// `status --json` output: the summary, plus the event log when asked for
#[derive(Debug, Serialize)]
pub struct StatusJsonOutput<'a> {
    #[serde(flatten)]
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<&'a [LogEntry]>,
}

pub fn emit_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("Failed to emit run summary JSON")
}

pub fn emit_status_json(output: &StatusJsonOutput<'_>) -> Result<String> {
    serde_json::to_string_pretty(output).context("Failed to emit status JSON")
}

pub fn emit_list_json(summaries: &[RunSummary]) -> Result<String> {
    serde_json::to_string_pretty(summaries).context("Failed to emit run list JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizardpro_phase_api::{LogLevel, RunState};

    #[test]
    fn test_status_json_flattens_summary() {
        let mut state = RunState::new("proj_j", "x");
        state.log("Phase1_Requirements", LogLevel::Info, "started", None);
        let output = StatusJsonOutput {
            summary: RunSummary::from_state(&state),
            events: Some(&state.event_log),
        };

        let value: serde_json::Value =
            serde_json::from_str(&emit_status_json(&output).unwrap()).unwrap();
        assert_eq!(value["run_id"], "proj_j");
        assert_eq!(value["status"], "Pending");
        assert_eq!(value["events"][0]["level"], "INFO");
    }

    #[test]
    fn test_events_omitted_unless_requested() {
        let state = RunState::new("proj_j", "x");
        let output = StatusJsonOutput {
            summary: RunSummary::from_state(&state),
            events: None,
        };
        let value: serde_json::Value =
            serde_json::from_str(&emit_status_json(&output).unwrap()).unwrap();
        assert!(value.get("events").is_none());
    }
}
