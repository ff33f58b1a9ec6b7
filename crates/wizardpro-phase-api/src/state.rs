//! Persisted state of one workflow run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use wizardpro_llm::GenerationResponse;

/// `current_phase` value before any phase has run
pub const INITIAL_PHASE: &str = "Initialization";

/// Well-known artifact keys written by the pipeline phases
pub mod artifacts {
    pub const REQUIREMENTS: &str = "requirements";
    pub const ARCHITECTURE: &str = "architecture";
    pub const TECHNOLOGY_STACK: &str = "technology_stack";
    pub const GENERATED_FILES: &str = "generated_files";
    pub const TEST_RESULTS: &str = "test_results";
    pub const DEBUGGING_INFO: &str = "debugging_info";
    pub const DEPLOYMENT: &str = "deployment";
    pub const DOCUMENTATION: &str = "documentation";
}

/// Lifecycle status of a run.
///
/// A phase must return with `PhaseComplete`, `NeedsUserInput` or `Error`.
/// `Complete` is set only by the engine after the last phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Running,
    PhaseComplete,
    NeedsUserInput,
    Error,
    Complete,
}

impl RunStatus {
    /// Statuses a phase is allowed to leave behind
    #[must_use]
    pub fn is_phase_outcome(self) -> bool {
        matches!(self, Self::PhaseComplete | Self::NeedsUserInput | Self::Error)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::PhaseComplete => "PhaseComplete",
            Self::NeedsUserInput => "NeedsUserInput",
            Self::Error => "Error",
            Self::Complete => "Complete",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// One entry in the append-only event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub phase: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// History record of one generation call.
///
/// Keeps everything from the response except the raw provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub phase: String,
    pub model: String,
    pub text: String,
    pub cost: Option<f64>,
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
    pub finish_reason: Option<String>,
}

impl CallRecord {
    #[must_use]
    pub fn from_response(phase: &str, response: &GenerationResponse) -> Self {
        Self {
            timestamp: Utc::now(),
            phase: phase.to_string(),
            model: response.model.clone(),
            text: response.text.clone(),
            cost: response.cost,
            latency_ms: response.latency_ms,
            error: response.error.clone(),
            finish_reason: response.finish_reason.clone(),
        }
    }
}

/// What a paused phase is waiting for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRequest {
    pub phase: String,
    pub prompt: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Input supplied by the caller on resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub timestamp: DateTime<Utc>,
    pub phase: String,
    pub response: String,
}

/// The unit of persistence and resumption.
///
/// `status` and `current_phase` together determine where a resumed run
/// continues. `call_history`, `event_log` and `user_feedback` only grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub initial_request: String,
    #[serde(default)]
    pub artifacts: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub call_history: Vec<CallRecord>,
    #[serde(default)]
    pub event_log: Vec<LogEntry>,
    pub current_phase: String,
    pub status: RunStatus,
    #[serde(default)]
    pub latest_user_response: Option<String>,
    #[serde(default)]
    pub user_feedback: Vec<UserFeedback>,
    #[serde(default)]
    pub pending_input: Option<InputRequest>,
    #[serde(default)]
    pub selected_wrappers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    #[must_use]
    pub fn new(run_id: impl Into<String>, initial_request: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            initial_request: initial_request.into(),
            artifacts: BTreeMap::new(),
            call_history: Vec::new(),
            event_log: Vec::new(),
            current_phase: INITIAL_PHASE.to_string(),
            status: RunStatus::Pending,
            latest_user_response: None,
            user_feedback: Vec::new(),
            pending_input: None,
            selected_wrappers: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_wrappers(mut self, wrappers: Vec<String>) -> Self {
        self.selected_wrappers = wrappers;
        self
    }

    /// Append to the event log; `level` is stored normalized
    pub fn log(
        &mut self,
        phase: &str,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<String>,
    ) {
        self.event_log.push(LogEntry {
            timestamp: Utc::now(),
            phase: phase.to_string(),
            level,
            message: message.into(),
            details,
        });
    }

    pub fn record_call(&mut self, phase: &str, response: &GenerationResponse) {
        self.call_history
            .push(CallRecord::from_response(phase, response));
    }

    pub fn set_status(&mut self, status: RunStatus, phase: Option<&str>) {
        self.status = status;
        if let Some(phase) = phase {
            self.current_phase = phase.to_string();
        }
    }

    pub fn mark_complete(&mut self, phase: &str) {
        self.set_status(RunStatus::PhaseComplete, Some(phase));
    }

    /// Log an error and move the run to `Error`
    pub fn mark_error(&mut self, phase: &str, message: impl Into<String>, details: Option<String>) {
        self.log(phase, LogLevel::Error, message, details);
        self.set_status(RunStatus::Error, Some(phase));
    }

    /// Pause the run until the caller supplies input
    pub fn request_input(&mut self, phase: &str, prompt: impl Into<String>, questions: Vec<String>) {
        self.pending_input = Some(InputRequest {
            phase: phase.to_string(),
            prompt: prompt.into(),
            questions,
        });
        self.set_status(RunStatus::NeedsUserInput, Some(phase));
    }

    /// Record caller input for the phase that will run next
    pub fn supply_user_input(&mut self, input: impl Into<String>) {
        let input = input.into();
        let phase = self
            .pending_input
            .as_ref()
            .map(|p| p.phase.clone())
            .unwrap_or_else(|| self.current_phase.clone());
        self.user_feedback.push(UserFeedback {
            timestamp: Utc::now(),
            phase,
            response: input.clone(),
        });
        self.latest_user_response = Some(input);
        self.pending_input = None;
    }

    /// Consume the pending user response, if any
    pub fn take_user_response(&mut self) -> Option<String> {
        self.latest_user_response.take()
    }

    #[must_use]
    pub fn artifact(&self, key: &str) -> Option<&serde_json::Value> {
        self.artifacts.get(key)
    }

    pub fn set_artifact(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.artifacts.insert(key.into(), value);
    }

    /// Edit an object-valued artifact in place.
    ///
    /// A missing artifact, or one that is not an object, starts out empty.
    pub fn update_object_artifact<F>(&mut self, key: &str, edit: F)
    where
        F: FnOnce(&mut serde_json::Map<String, serde_json::Value>),
    {
        let mut map = match self.artifacts.remove(key) {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        edit(&mut map);
        self.artifacts
            .insert(key.to_string(), serde_json::Value::Object(map));
    }

    /// Edit an array-valued artifact in place.
    ///
    /// A missing artifact, or one that is not an array, starts out empty.
    pub fn update_array_artifact<F>(&mut self, key: &str, edit: F)
    where
        F: FnOnce(&mut Vec<serde_json::Value>),
    {
        let mut items = match self.artifacts.remove(key) {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        };
        edit(&mut items);
        self.artifacts
            .insert(key.to_string(), serde_json::Value::Array(items));
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.event_log.iter().filter(|e| e.level.is_error()).count()
    }
}
