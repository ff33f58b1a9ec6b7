use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use wizardpro_phase_api::{RunState, RunStatus, artifacts};

/// Read-only counts derived from a run state for status output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub current_phase: String,
    pub calls: usize,
    pub failed_calls: usize,
    pub generated_files: usize,
    pub log_entries: usize,
    pub errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunSummary {
    #[must_use]
    pub fn from_state(state: &RunState) -> Self {
        let generated_files = state
            .artifact(artifacts::GENERATED_FILES)
            .and_then(|v| v.as_object())
            .map_or(0, serde_json::Map::len);

        Self {
            run_id: state.run_id.clone(),
            status: state.status,
            current_phase: state.current_phase.clone(),
            calls: state.call_history.len(),
            failed_calls: state
                .call_history
                .iter()
                .filter(|c| c.error.is_some())
                .count(),
            generated_files,
            log_entries: state.event_log.len(),
            errors: state.error_count(),
            pending_prompt: state.pending_input.as_ref().map(|p| p.prompt.clone()),
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run:             {}", self.run_id)?;
        writeln!(f, "Status:          {}", self.status)?;
        writeln!(f, "Current phase:   {}", self.current_phase)?;
        writeln!(
            f,
            "Calls:           {} ({} failed)",
            self.calls, self.failed_calls
        )?;
        writeln!(f, "Generated files: {}", self.generated_files)?;
        writeln!(
            f,
            "Event log:       {} entries, {} errors",
            self.log_entries, self.errors
        )?;
        if let Some(prompt) = &self.pending_prompt {
            writeln!(f, "Awaiting input:  {prompt}")?;
        }
        write!(
            f,
            "Updated:         {}",
            self.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wizardpro_llm::GenerationResponse;
    use wizardpro_phase_api::LogLevel;

    #[test]
    fn test_counts_reflect_state() {
        let mut state = RunState::new("proj_s", "x");
        state.record_call("P", &GenerationResponse::ok("m", "text"));
        state.record_call("P", &GenerationResponse::failed("m", "boom"));
        state.log("P", LogLevel::Info, "fine", None);
        state.log("P", LogLevel::Error, "bad", None);
        state.set_artifact(
            artifacts::GENERATED_FILES,
            json!({"main.py": "print()", "util.py": ""}),
        );
        state.request_input("P", "Which database?", vec![]);

        let summary = RunSummary::from_state(&state);
        assert_eq!(summary.calls, 2);
        assert_eq!(summary.failed_calls, 1);
        assert_eq!(summary.generated_files, 2);
        assert_eq!(summary.log_entries, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.status, RunStatus::NeedsUserInput);
        assert_eq!(summary.pending_prompt.as_deref(), Some("Which database?"));

        let text = summary.to_string();
        assert!(text.contains("Awaiting input:  Which database?"));
        assert!(text.contains("2 (1 failed)"));
    }

    #[test]
    fn test_non_object_generated_files_counts_zero() {
        let mut state = RunState::new("proj_s", "x");
        state.set_artifact(artifacts::GENERATED_FILES, json!("raw"));
        assert_eq!(RunSummary::from_state(&state).generated_files, 0);
    }
}
