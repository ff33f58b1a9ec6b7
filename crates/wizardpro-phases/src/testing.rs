use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};
use wizardpro_phase_api::{LogLevel, Phase, RunState, RunStatus, artifacts};

use crate::call::PhaseLlm;
use crate::parsing::yaml_block;
use crate::prompts;

pub const TESTING_PHASE: &str = "Phase4_Testing";

/// Asks for test results and bug reports on the generated files and
/// merges any corrected files back in.
#[derive(Debug, Clone)]
pub struct TestingPhase {
    llm: PhaseLlm,
}

impl TestingPhase {
    #[must_use]
    pub fn new(llm: PhaseLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Phase for TestingPhase {
    fn name(&self) -> &str {
        TESTING_PHASE
    }

    async fn run(&self, state: &mut RunState) -> Result<()> {
        if !has_generated_files(state) {
            state.mark_error(TESTING_PHASE, "Generated code missing for testing.", None);
            return Ok(());
        }

        let prompt = prompts::testing(state);
        let response = self
            .llm
            .call(state, TESTING_PHASE, TESTING_PHASE, prompt)
            .await;
        if response.error.is_some() {
            warn!("Testing call failed; halting phase");
            state.set_status(RunStatus::Error, Some(TESTING_PHASE));
            return Ok(());
        }

        match yaml_block(&response.text) {
            Some(Value::Object(report)) => {
                let results = array_field(&report, "test_results");
                let bugs = array_field(&report, "bugs_found");
                info!(
                    tests = results.len(),
                    bugs = bugs.len(),
                    "Parsed testing report"
                );
                state.update_array_artifact(artifacts::TEST_RESULTS, |items| {
                    items.extend(results);
                });
                state.update_array_artifact(artifacts::DEBUGGING_INFO, |items| {
                    items.extend(bugs);
                });

                if let Some(Value::Object(corrected)) = report.get("corrected_code")
                    && !corrected.is_empty()
                {
                    info!(files = corrected.len(), "Applying corrected files");
                    state.update_object_artifact(artifacts::GENERATED_FILES, |files| {
                        for (path, code) in corrected {
                            let code = code
                                .as_str()
                                .map_or_else(|| code.to_string(), str::to_string);
                            files.insert(path.clone(), Value::String(code));
                        }
                    });
                }
            }
            _ => {
                warn!("Testing report was not structured; storing raw output");
                let raw = format!("Raw Phase 4 Output:\n{}", response.text);
                state.update_array_artifact(artifacts::DEBUGGING_INFO, |items| {
                    items.push(Value::String(raw));
                });
                state.update_array_artifact(artifacts::TEST_RESULTS, |items| {
                    items.push(json!({"name": "parsing_failed", "result": "Unknown"}));
                });
                state.log(
                    TESTING_PHASE,
                    LogLevel::Warning,
                    "Testing report could not be parsed; raw output stored",
                    None,
                );
            }
        }

        state.mark_complete(TESTING_PHASE);
        Ok(())
    }
}

pub(crate) fn has_generated_files(state: &RunState) -> bool {
    state
        .artifact(artifacts::GENERATED_FILES)
        .and_then(Value::as_object)
        .is_some_and(|files| !files.is_empty())
}

fn array_field(report: &serde_json::Map<String, Value>, key: &str) -> Vec<Value> {
    match report.get(key) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}
