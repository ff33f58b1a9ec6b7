//! Inline prompt text for each phase and its follow-up calls
//!
//! Prompts receive the parts of the run state they need as JSON and spell
//! out the exact output shape the matching parser in this crate expects.

use serde_json::Value;
use wizardpro_phase_api::{RunState, artifacts};

pub const PROCESS_USER_RESPONSE: &str = "ProcessUserResponse";
pub const PARSE_REQUIREMENTS_JSON: &str = "ParseRequirementsJSON";
pub const PARSE_ARCHITECTURE_JSON: &str = "ParseArchitectureJSON";
pub const REFACTOR_CODE: &str = "RefactorCode";

fn pretty(value: Option<&Value>) -> String {
    value
        .and_then(|v| serde_json::to_string_pretty(v).ok())
        .unwrap_or_else(|| "(none)".to_string())
}

/// Prepend the caller's wrapper selection, if any
fn wrap(state: &RunState, core: String) -> String {
    if state.selected_wrappers.is_empty() {
        return core;
    }
    format!(
        "Apply these additional guidelines throughout: {}\n\n---\n\n{core}",
        state.selected_wrappers.join(", ")
    )
}

pub fn requirements(state: &RunState) -> String {
    wrap(
        state,
        format!(
            "You are a senior requirements analyst. Turn the request below into clear, \
             testable software requirements: goals, functional requirements, non-functional \
             requirements, constraints and open questions. If something essential is \
             ambiguous, list the questions you need answered.\n\n\
             Request:\n{}",
            state.initial_request
        ),
    )
}

pub fn process_user_response(state: &RunState, previous: Option<&Value>, response: &str) -> String {
    wrap(
        state,
        format!(
            "You are refining software requirements after receiving answers from the user.\n\n\
             Original request:\n{}\n\n\
             Requirements so far:\n{}\n\n\
             User response:\n{response}\n\n\
             Produce the updated, complete requirements. List any questions that remain open.",
            state.initial_request,
            pretty(previous),
        ),
    )
}

pub fn parse_requirements(raw: &str) -> String {
    format!(
        "Convert the requirements text below into a single JSON object. Use the keys \
         \"goals\", \"functional_requirements\", \"non_functional_requirements\", \
         \"constraints\" and \"open_questions\". If the text says essential information is \
         missing, set \"status\" to \"NeedsUserInput\" and put the questions for the user \
         in \"questions\" (a list of strings). If the text cannot be interpreted, return \
         {{\"error\": \"<reason>\"}}. Respond with JSON only.\n\n\
         Requirements text:\n{raw}"
    )
}

pub fn architecture(state: &RunState) -> String {
    wrap(
        state,
        format!(
            "You are a software architect. Design the system for the requirements below: \
             components and their responsibilities, data flow, storage, external interfaces, \
             and the technology stack with a short justification for each choice.\n\n\
             Request:\n{}\n\n\
             Requirements:\n{}",
            state.initial_request,
            pretty(state.artifact(artifacts::REQUIREMENTS)),
        ),
    )
}

pub fn parse_architecture(raw: &str) -> String {
    format!(
        "Convert the architecture description below into a JSON object with exactly two \
         keys: \"architecture_document\" (an object describing components, data flow and \
         interfaces) and \"technology_stack\" (a list of strings). If the text cannot be \
         interpreted, return {{\"error\": \"<reason>\"}}. Respond with JSON only.\n\n\
         Architecture text:\n{raw}"
    )
}

pub fn code_generation(state: &RunState) -> String {
    wrap(
        state,
        format!(
            "You are a senior software engineer. Implement the system described below. \
             Emit every file as a line '# File: <relative/path>' immediately followed by a \
             fenced code block with the file's full contents.\n\n\
             Request:\n{}\n\n\
             Requirements:\n{}\n\n\
             Architecture:\n{}\n\n\
             Technology stack:\n{}",
            state.initial_request,
            pretty(state.artifact(artifacts::REQUIREMENTS)),
            pretty(state.artifact(artifacts::ARCHITECTURE)),
            pretty(state.artifact(artifacts::TECHNOLOGY_STACK)),
        ),
    )
}

pub fn refactor_code(path: &str, language: &str, code: &str, analysis: &str) -> String {
    format!(
        "Refactor the {language} file '{path}' for readability and robustness without \
         changing its behaviour. Reviewer notes: {analysis}\n\n\
         Return only the complete refactored file contents.\n\n\
         Current contents:\n{code}"
    )
}

pub fn testing(state: &RunState) -> String {
    wrap(
        state,
        format!(
            "You are a QA engineer. Review the generated code below, write the tests you \
             would run, and reason about their results. Reply with one ```yaml block \
             containing:\n\
             test_results: list of {{name, result, details}}\n\
             bugs_found: list of strings\n\
             corrected_code: mapping of file path to full corrected contents (only for \
             files you changed)\n\n\
             Requirements:\n{}\n\n\
             Generated files:\n{}",
            pretty(state.artifact(artifacts::REQUIREMENTS)),
            pretty(state.artifact(artifacts::GENERATED_FILES)),
        ),
    )
}

pub fn deployment(state: &RunState) -> String {
    wrap(
        state,
        format!(
            "You are a DevOps engineer and technical writer. Prepare the project below for \
             deployment. Reply with a ```yaml block containing 'deployment_config' and \
             'documentation' mappings, then emit any files (Dockerfile, docker-compose.yml, \
             CI workflows, README.md) as '# File: <name>' followed by a fenced block.\n\n\
             Architecture:\n{}\n\n\
             Technology stack:\n{}\n\n\
             Generated files:\n{}",
            pretty(state.artifact(artifacts::ARCHITECTURE)),
            pretty(state.artifact(artifacts::TECHNOLOGY_STACK)),
            pretty(state.artifact(artifacts::GENERATED_FILES)),
        ),
    )
}
