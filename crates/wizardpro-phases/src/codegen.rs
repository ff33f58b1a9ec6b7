use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use wizardpro_phase_api::{LogLevel, Phase, RunState, RunStatus, artifacts};

use crate::call::PhaseLlm;
use crate::parsing::{file_blocks, simple_blocks};
use crate::prompts;

pub const CODE_GENERATION_PHASE: &str = "Phase3_CodeGeneration";

/// Files examined by the refinement pass per run of the phase
pub const MAX_REFINEMENT_ATTEMPTS: usize = 3;

/// Refined output shorter than this is treated as a failed refinement
const MIN_REFINED_LEN: usize = 10;

const MULTIPLE_BLOCKS_FILE: &str = "phase3_raw_output_multiple_blocks.txt";
const NO_BLOCKS_FILE: &str = "phase3_raw_output_no_blocks.txt";

/// Generates project files from the architecture, then runs a bounded
/// refinement pass over them.
#[derive(Debug, Clone)]
pub struct CodeGenerationPhase {
    llm: PhaseLlm,
}

impl CodeGenerationPhase {
    #[must_use]
    pub fn new(llm: PhaseLlm) -> Self {
        Self { llm }
    }

    async fn refine(&self, state: &mut RunState, mut queue: VecDeque<String>) {
        let mut attempt = 0;
        while attempt < MAX_REFINEMENT_ATTEMPTS
            && let Some(path) = queue.pop_front()
        {
            attempt += 1;
            debug!(attempt, path = %path, "Refinement attempt");

            let Some(code) = generated_file(state, &path).filter(|c| !c.is_empty()) else {
                warn!(path = %path, "Skipping refinement; file content missing");
                continue;
            };
            let Some(analysis) = review(&path) else {
                debug!(path = %path, "Review found nothing to refine");
                continue;
            };

            let language = path.rsplit('.').next().unwrap_or_default();
            let prompt = prompts::refactor_code(&path, language, &code, analysis);
            let refined = self
                .llm
                .call(state, CODE_GENERATION_PHASE, prompts::REFACTOR_CODE, prompt)
                .await;
            if refined.error.is_some() {
                warn!(path = %path, "Refinement call failed; keeping original");
                continue;
            }

            let refined = unfence(&refined.text);
            if refined.chars().count() > MIN_REFINED_LEN {
                info!(path = %path, "Applied refinement");
                state.update_object_artifact(artifacts::GENERATED_FILES, |files| {
                    files.insert(path.clone(), Value::String(refined));
                });
            } else {
                warn!(path = %path, "Refinement output empty or too short; keeping original");
            }
        }

        if !queue.is_empty() {
            warn!(pending = ?queue, "Refinement attempt limit reached");
        }
    }
}

#[async_trait]
impl Phase for CodeGenerationPhase {
    fn name(&self) -> &str {
        CODE_GENERATION_PHASE
    }

    async fn run(&self, state: &mut RunState) -> Result<()> {
        if !state
            .artifact(artifacts::ARCHITECTURE)
            .is_some_and(Value::is_object)
        {
            state.mark_error(
                CODE_GENERATION_PHASE,
                "Architecture document missing or invalid for Phase 3.",
                None,
            );
            return Ok(());
        }
        let has_stack = state
            .artifact(artifacts::TECHNOLOGY_STACK)
            .and_then(Value::as_array)
            .is_some_and(|s| !s.is_empty());
        if !has_stack {
            warn!("Technology stack missing; generated code may be less specific");
        }

        let prompt = prompts::code_generation(state);
        let response = self
            .llm
            .call(state, CODE_GENERATION_PHASE, CODE_GENERATION_PHASE, prompt)
            .await;
        if response.error.is_some() {
            warn!("Code generation call failed; halting phase");
            state.set_status(RunStatus::Error, Some(CODE_GENERATION_PHASE));
            return Ok(());
        }
        let text = response.text;

        let mut files = file_blocks(&text);
        if files.is_empty() {
            let mut blocks = simple_blocks(&text).into_iter();
            match (blocks.next(), blocks.next()) {
                (Some((lang, code)), None) => {
                    let ext = if lang == "unknown" { "txt" } else { lang.as_str() };
                    let name = format!("generated_code.{ext}");
                    info!(file = %name, "Single unlabelled block; using placeholder name");
                    files.insert(name, code);
                }
                (Some(_), Some(_)) => {
                    warn!("Several unlabelled blocks; storing raw output");
                    store_files(state, [(MULTIPLE_BLOCKS_FILE.to_string(), text.clone())]);
                    state.log(
                        CODE_GENERATION_PHASE,
                        LogLevel::Warning,
                        "Code blocks had no file markers; raw output stored",
                        Some(MULTIPLE_BLOCKS_FILE.to_string()),
                    );
                }
                (None, _) => {
                    store_files(state, [(NO_BLOCKS_FILE.to_string(), text.clone())]);
                    state.mark_error(
                        CODE_GENERATION_PHASE,
                        "Failed to parse any code blocks from the model output.",
                        Some(NO_BLOCKS_FILE.to_string()),
                    );
                    return Ok(());
                }
            }
        }

        let queue: VecDeque<String> = files.keys().cloned().collect();
        if !files.is_empty() {
            info!(files = files.len(), "Stored generated files");
            store_files(state, files);
        }

        self.refine(state, queue).await;
        state.mark_complete(CODE_GENERATION_PHASE);
        Ok(())
    }
}

fn store_files(state: &mut RunState, files: impl IntoIterator<Item = (String, String)>) {
    state.update_object_artifact(artifacts::GENERATED_FILES, |map| {
        for (path, code) in files {
            map.insert(path, json!(code));
        }
    });
}

fn generated_file(state: &RunState, path: &str) -> Option<String> {
    state
        .artifact(artifacts::GENERATED_FILES)?
        .get(path)?
        .as_str()
        .map(str::to_string)
}

/// Refinement suggestion for a file, if any
fn review(path: &str) -> Option<&'static str> {
    path.ends_with(".py")
        .then_some("Apply a basic refactor: clear names, small functions, explicit error handling.")
}

/// Single fenced block content, or the trimmed text as is
fn unfence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let mut blocks = simple_blocks(trimmed).into_values();
        if let (Some(code), None) = (blocks.next(), blocks.next()) {
            return code;
        }
    }
    trimmed.to_string()
}
