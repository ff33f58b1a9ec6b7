use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};
use wizardpro_phase_api::{LogLevel, Phase, RunState, RunStatus, artifacts};

use crate::call::PhaseLlm;
use crate::parsing::strip_json_fence;
use crate::prompts;
use crate::requirements::{NEEDS_USER_INPUT, parsing_status};

pub const ARCHITECTURE_PHASE: &str = "Phase2_Architecture";

/// System design from the stored requirements, converted to an
/// `architecture` object and a `technology_stack` list.
#[derive(Debug, Clone)]
pub struct ArchitecturePhase {
    llm: PhaseLlm,
}

impl ArchitecturePhase {
    #[must_use]
    pub fn new(llm: PhaseLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Phase for ArchitecturePhase {
    fn name(&self) -> &str {
        ARCHITECTURE_PHASE
    }

    async fn run(&self, state: &mut RunState) -> Result<()> {
        let Some(requirements) = state
            .artifact(artifacts::REQUIREMENTS)
            .filter(|v| v.is_object())
        else {
            state.mark_error(
                ARCHITECTURE_PHASE,
                "Refined requirements missing or invalid for Phase 2.",
                None,
            );
            return Ok(());
        };
        let req_status = parsing_status(requirements).to_string();
        if req_status == NEEDS_USER_INPUT {
            state.mark_error(
                ARCHITECTURE_PHASE,
                "Cannot proceed to Phase 2, Phase 1 requires user input.",
                None,
            );
            return Ok(());
        }
        if req_status.starts_with("Failed") {
            warn!("Requirements were not structured; architecture quality may suffer");
        }

        let prompt = prompts::architecture(state);
        let designed = self
            .llm
            .call(state, ARCHITECTURE_PHASE, ARCHITECTURE_PHASE, prompt)
            .await;
        if designed.error.is_some() {
            warn!("Architecture call failed; halting phase");
            state.set_status(RunStatus::Error, Some(ARCHITECTURE_PHASE));
            return Ok(());
        }
        let raw = designed.text;

        let parsed = self
            .llm
            .call(
                state,
                ARCHITECTURE_PHASE,
                prompts::PARSE_ARCHITECTURE_JSON,
                prompts::parse_architecture(&raw),
            )
            .await;

        let (architecture, stack) = match &parsed.error {
            Some(_) => (
                json!({"raw_output": raw, "parsing_status": "Failed - Parsing LLM call error"}),
                json!(["Parsing LLM failed"]),
            ),
            None => interpret(&raw, &parsed.text),
        };

        let status = parsing_status(&architecture).to_string();
        if status.starts_with("Failed") {
            state.log(
                ARCHITECTURE_PHASE,
                LogLevel::Warning,
                "Architecture could not be structured; raw output stored",
                Some(status),
            );
        } else {
            info!(
                technologies = stack.as_array().map_or(0, Vec::len),
                "Architecture parsed"
            );
        }
        state.set_artifact(artifacts::ARCHITECTURE, architecture);
        state.set_artifact(artifacts::TECHNOLOGY_STACK, stack);
        state.mark_complete(ARCHITECTURE_PHASE);
        Ok(())
    }
}

fn interpret(raw: &str, parser_text: &str) -> (Value, Value) {
    let body = strip_json_fence(parser_text);
    let parsed = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Architecture parser reply is not JSON");
            return (
                json!({
                    "raw_output": raw,
                    "parsing_status": "Failed - JSONDecodeError",
                    "parser_response": body,
                }),
                json!(["JSONDecodeError from parser"]),
            );
        }
    };

    let Value::Object(map) = &parsed else {
        return (
            json!({
                "raw_output": raw,
                "parsing_status": "Failed - Invalid JSON from parser",
                "parser_response": body,
            }),
            json!(["Invalid JSON from parser"]),
        );
    };

    if let Some(err) = map.get("error").filter(|e| !e.is_null()) {
        let reason = err.as_str().map_or_else(|| err.to_string(), str::to_string);
        return (
            json!({
                "raw_output": raw,
                "parsing_status": format!("Failed - Parser Error: {reason}"),
            }),
            json!(["Parsing LLM reported error"]),
        );
    }

    match (map.get("architecture_document"), map.get("technology_stack")) {
        (Some(Value::Object(doc)), Some(stack @ Value::Array(_))) => {
            let mut doc = doc.clone();
            doc.insert("parsing_status".to_string(), json!("Success"));
            (Value::Object(doc), stack.clone())
        }
        _ => (
            json!({
                "raw_output": raw,
                "parsing_status": "Failed - Invalid JSON structure from parser",
                "parser_response": parsed.clone(),
            }),
            json!(["Invalid structure from parser"]),
        ),
    }
}
