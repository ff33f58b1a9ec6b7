//! Requirements elicitation
//!
//! One call turns the request (or the user's answers) into requirements
//! prose, a second call converts that prose to JSON. The phase pauses when
//! the converted requirements carry `"status": "NeedsUserInput"`.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};
use wizardpro_phase_api::{LogLevel, Phase, RunState, RunStatus, artifacts};

use crate::call::PhaseLlm;
use crate::parsing::strip_json_fence;
use crate::prompts;

pub const REQUIREMENTS_PHASE: &str = "Phase1_Requirements";

/// Token the parser call uses to ask for more input
pub const NEEDS_USER_INPUT: &str = "NeedsUserInput";

const DEFAULT_INPUT_PROMPT: &str = "More information is needed to refine the requirements.";

#[derive(Debug, Clone)]
pub struct RequirementsPhase {
    llm: PhaseLlm,
}

impl RequirementsPhase {
    #[must_use]
    pub fn new(llm: PhaseLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Phase for RequirementsPhase {
    fn name(&self) -> &str {
        REQUIREMENTS_PHASE
    }

    async fn run(&self, state: &mut RunState) -> Result<()> {
        let elicited = match state.take_user_response() {
            Some(answer) => {
                info!("Processing user response for requirements");
                let prompt = prompts::process_user_response(
                    &state,
                    state.artifact(artifacts::REQUIREMENTS),
                    &answer,
                );
                self.llm
                    .call(
                        state,
                        REQUIREMENTS_PHASE,
                        prompts::PROCESS_USER_RESPONSE,
                        prompt,
                    )
                    .await
            }
            None => {
                if state.initial_request.trim().is_empty() {
                    state.mark_error(REQUIREMENTS_PHASE, "Initial user request is missing.", None);
                    return Ok(());
                }
                info!("Gathering initial requirements");
                let prompt = prompts::requirements(state);
                self.llm
                    .call(state, REQUIREMENTS_PHASE, REQUIREMENTS_PHASE, prompt)
                    .await
            }
        };

        if elicited.error.is_some() {
            warn!("Requirements call failed; halting phase");
            state.set_status(RunStatus::Error, Some(REQUIREMENTS_PHASE));
            return Ok(());
        }
        let raw = elicited.text;

        let parsed = self
            .llm
            .call(
                state,
                REQUIREMENTS_PHASE,
                prompts::PARSE_REQUIREMENTS_JSON,
                prompts::parse_requirements(&raw),
            )
            .await;

        let requirements = match &parsed.error {
            Some(err) => json!({
                "raw_output": raw,
                "parsing_status": "Failed - Parsing LLM call error",
                "parsing_error": err,
            }),
            None => interpret(&raw, &parsed.text),
        };

        let status = parsing_status(&requirements).to_string();
        let pending = (status == NEEDS_USER_INPUT).then(|| input_request(&requirements));
        if status.starts_with("Failed") {
            state.log(
                REQUIREMENTS_PHASE,
                LogLevel::Warning,
                "Requirements could not be structured; raw output stored",
                Some(status),
            );
        }
        state.set_artifact(artifacts::REQUIREMENTS, requirements);

        match pending {
            Some((prompt, questions)) => {
                info!(questions = questions.len(), "Requirements need user input");
                state.request_input(REQUIREMENTS_PHASE, prompt, questions);
            }
            None => state.mark_complete(REQUIREMENTS_PHASE),
        }
        Ok(())
    }
}

/// Turn the parser call's reply into the stored requirements object
fn interpret(raw: &str, parser_text: &str) -> Value {
    let body = strip_json_fence(parser_text);
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut map)) => {
            let mut status = map
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("Parsed")
                .to_string();
            if status != NEEDS_USER_INPUT && map.get("error").is_some_and(is_truthy) {
                warn!(error = %map["error"], "Requirements parser reported an error");
                status = "Failed - Parser reported error".to_string();
            }
            map.insert("parsing_status".to_string(), Value::String(status));
            Value::Object(map)
        }
        Ok(_) => json!({
            "raw_output": raw,
            "parsing_status": "Failed - Invalid JSON from parser",
            "parser_response": body,
        }),
        Err(err) => {
            warn!(error = %err, "Requirements parser reply is not JSON");
            json!({
                "raw_output": raw,
                "parsing_status": "Failed - JSONDecodeError",
                "parser_response": body,
            })
        }
    }
}

pub(crate) fn parsing_status(value: &Value) -> &str {
    value
        .get("parsing_status")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn input_request(requirements: &Value) -> (String, Vec<String>) {
    let questions = requirements
        .get("questions")
        .or_else(|| requirements.get("open_questions"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|q| q.as_str().map_or_else(|| q.to_string(), str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let prompt = requirements
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_INPUT_PROMPT)
        .to_string();
    (prompt, questions)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
