use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};
use wizardpro_phase_api::{Phase, RunState, artifacts};

use crate::call::PhaseLlm;
use crate::parsing::{file_blocks, yaml_block};
use crate::prompts;
use crate::testing::has_generated_files;

pub const DEPLOYMENT_PHASE: &str = "Phase5_Deployment";

/// File names (lowercased) that belong to deployment config as is
const DEPLOYMENT_FILES: [&str; 4] = [
    "dockerfile",
    "docker-compose.yml",
    ".gitlab-ci.yml",
    "github_workflow.yaml",
];

#[derive(Debug, Clone)]
pub struct DeploymentPhase {
    llm: PhaseLlm,
}

impl DeploymentPhase {
    #[must_use]
    pub fn new(llm: PhaseLlm) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Phase for DeploymentPhase {
    fn name(&self) -> &str {
        DEPLOYMENT_PHASE
    }

    async fn run(&self, state: &mut RunState) -> Result<()> {
        if !has_generated_files(state) {
            state.mark_error(DEPLOYMENT_PHASE, "Generated code missing for Phase 5.", None);
            return Ok(());
        }

        let prompt = prompts::deployment(state);
        let response = self
            .llm
            .call(state, DEPLOYMENT_PHASE, DEPLOYMENT_PHASE, prompt)
            .await;
        if response.error.is_some() {
            state.mark_error(
                DEPLOYMENT_PHASE,
                format!("LLM call failed during {DEPLOYMENT_PHASE}"),
                response.error.clone(),
            );
            return Ok(());
        }
        let text = response.text;

        let mut deployment = Map::new();
        let mut documentation = Map::new();

        match yaml_block(&text) {
            Some(Value::Object(parsed)) => {
                info!("Parsed deployment YAML");
                if let Some(Value::Object(config)) = parsed.get("deployment_config") {
                    deployment.extend(config.clone());
                }
                if let Some(Value::Object(docs)) = parsed.get("documentation") {
                    documentation.extend(docs.clone());
                }
            }
            _ => warn!("Deployment YAML missing or unparsable"),
        }

        let files = file_blocks(&text);
        if !files.is_empty() {
            info!(files = files.len(), "Parsed deployment file blocks");
        }
        for (path, content) in files {
            let lower = path.to_lowercase();
            if DEPLOYMENT_FILES.contains(&lower.as_str()) {
                deployment.insert(path, Value::String(content));
            } else if lower.ends_with(".md") || lower.ends_with(".txt") {
                documentation.insert(path, Value::String(content));
            } else {
                deployment.insert(format!("generated_file_{path}"), Value::String(content));
            }
        }

        state.update_object_artifact(artifacts::DEPLOYMENT, |existing| {
            existing.extend(deployment);
            if existing.is_empty() {
                warn!("No deployment config parsed");
                existing.insert(
                    "placeholder".to_string(),
                    Value::String("Deployment config not parsed.".to_string()),
                );
            }
        });
        state.update_object_artifact(artifacts::DOCUMENTATION, |existing| {
            existing.extend(documentation);
            if existing.is_empty() {
                warn!("No documentation parsed");
                existing.insert(
                    "placeholder".to_string(),
                    Value::String("Documentation not parsed.".to_string()),
                );
            }
        });

        state.mark_complete(DEPLOYMENT_PHASE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Reply, RunOwned, ScriptedClient, llm_with};
    use serde_json::json;
    use wizardpro_phase_api::RunStatus;

    fn generated() -> RunState {
        let mut state = RunState::new("r", "x");
        state.set_artifact(artifacts::GENERATED_FILES, json!({"app.py": "print(1)"}));
        state
    }

    #[tokio::test]
    async fn test_yaml_and_file_blocks_are_classified() {
        let reply = "\
```yaml
deployment_config:
  platform: fly.io
documentation:
  overview: A todo CLI
```

# File: Dockerfile
```dockerfile
FROM python:3.12
```

# File: README.md
```markdown
# Todo
```

# File: scripts/deploy.sh
```bash
fly deploy
```
";
        let client = ScriptedClient::new(vec![Reply::text(reply)]);
        let state = DeploymentPhase::new(llm_with(&client))
            .run_owned(generated())
            .await
            .unwrap();

        assert_eq!(state.status, RunStatus::PhaseComplete);
        let deployment = state.artifact(artifacts::DEPLOYMENT).unwrap();
        assert_eq!(deployment["platform"], "fly.io");
        assert_eq!(deployment["Dockerfile"], "FROM python:3.12");
        assert_eq!(deployment["generated_file_scripts/deploy.sh"], "fly deploy");
        let docs = state.artifact(artifacts::DOCUMENTATION).unwrap();
        assert_eq!(docs["overview"], "A todo CLI");
        assert_eq!(docs["README.md"], "# Todo");
    }

    #[tokio::test]
    async fn test_unparsed_output_gets_placeholders() {
        let client = ScriptedClient::new(vec![Reply::text("Deploy it somewhere.")]);
        let state = DeploymentPhase::new(llm_with(&client))
            .run_owned(generated())
            .await
            .unwrap();

        assert_eq!(state.status, RunStatus::PhaseComplete);
        assert_eq!(
            state.artifact(artifacts::DEPLOYMENT).unwrap(),
            &json!({"placeholder": "Deployment config not parsed."})
        );
        assert_eq!(
            state.artifact(artifacts::DOCUMENTATION).unwrap(),
            &json!({"placeholder": "Documentation not parsed."})
        );
    }

    #[tokio::test]
    async fn test_failed_call_is_error() {
        let client = ScriptedClient::new(vec![Reply::fail("rate limited: slow down")]);
        let state = DeploymentPhase::new(llm_with(&client))
            .run_owned(generated())
            .await
            .unwrap();
        assert_eq!(state.status, RunStatus::Error);
        assert_eq!(
            state.event_log.last().unwrap().message,
            "LLM call failed during Phase5_Deployment"
        );
    }

    #[tokio::test]
    async fn test_missing_code_is_error() {
        let client = ScriptedClient::new(vec![]);
        let state = DeploymentPhase::new(llm_with(&client))
            .run_owned(RunState::new("r", "x"))
            .await
            .unwrap();
        assert_eq!(state.status, RunStatus::Error);
    }
}
