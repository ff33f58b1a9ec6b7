//! Concrete workflow phases
//!
//! Five phases take a request from requirements to deployment notes. Each
//! one makes its generation calls through [`PhaseLlm`], records every call
//! in the run state, and degrades to storing raw model output when the
//! output cannot be interpreted. Only failures that leave nothing usable
//! end the phase in `Error`.

use anyhow::Result;
use std::sync::Arc;
use wizardpro_config::Config;
use wizardpro_llm::ProviderRegistry;
use wizardpro_phase_api::{Phase, PhaseSequence};

mod architecture;
mod call;
mod codegen;
mod deployment;
pub mod parsing;
mod prompts;
mod requirements;
mod testing;

pub use architecture::{ARCHITECTURE_PHASE, ArchitecturePhase};
pub use call::PhaseLlm;
pub use codegen::{CODE_GENERATION_PHASE, CodeGenerationPhase, MAX_REFINEMENT_ATTEMPTS};
pub use deployment::{DEPLOYMENT_PHASE, DeploymentPhase};
pub use requirements::{NEEDS_USER_INPUT, REQUIREMENTS_PHASE, RequirementsPhase};
pub use testing::{TESTING_PHASE, TestingPhase};

/// Phase names in execution order
pub const PHASE_NAMES: [&str; 5] = [
    REQUIREMENTS_PHASE,
    ARCHITECTURE_PHASE,
    CODE_GENERATION_PHASE,
    TESTING_PHASE,
    DEPLOYMENT_PHASE,
];

/// Every model the default sequence will call, one per phase
#[must_use]
pub fn required_models(config: &Config) -> Vec<String> {
    PHASE_NAMES
        .iter()
        .map(|phase| config.model_for_phase(phase))
        .collect()
}

/// The standard five-phase pipeline, each phase bound to the model the
/// config selects for it.
///
/// # Errors
///
/// Fails only if the sequence itself is invalid.
pub fn default_sequence(registry: Arc<ProviderRegistry>, config: &Config) -> Result<PhaseSequence> {
    let llm = |phase: &str| PhaseLlm::new(Arc::clone(&registry), config.model_for_phase(phase));
    let phases: Vec<Arc<dyn Phase>> = vec![
        Arc::new(RequirementsPhase::new(llm(REQUIREMENTS_PHASE))),
        Arc::new(ArchitecturePhase::new(llm(ARCHITECTURE_PHASE))),
        Arc::new(CodeGenerationPhase::new(llm(CODE_GENERATION_PHASE))),
        Arc::new(TestingPhase::new(llm(TESTING_PHASE))),
        Arc::new(DeploymentPhase::new(llm(DEPLOYMENT_PHASE))),
    ];
    PhaseSequence::new(phases)
}
