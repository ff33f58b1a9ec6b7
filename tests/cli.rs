//! Command-line behaviour of the `wizardpro` binary
//!
//! Every test runs in its own temporary home: `WIZARDPRO_HOME` holds the
//! config file and runs are saved under `<home>/runs`. The API key lives in
//! a test-only environment variable named by the config.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wizardpro::{JsonFileStore, LogLevel, RunState, RunStatus, StateStore};

const KEY_ENV: &str = "WIZARDPRO_TEST_OPENAI_KEY";

struct Home {
    dir: TempDir,
}

impl Home {
    fn new() -> Self {
        Self::with_base_url(None)
    }

    fn with_base_url(base_url: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = format!(
            "[defaults]\nmodel = \"openai:gpt-4o-mini\"\nstate_dir = \"{}\"\n\n\
             [retry]\nmax_attempts = 1\n\n\
             [llm.openai]\napi_key_env = \"{KEY_ENV}\"\ntimeout_secs = 10\n",
            dir.path().join("runs").display()
        );
        if let Some(url) = base_url {
            config.push_str(&format!("base_url = \"{url}\"\n"));
        }
        fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn runs(&self) -> PathBuf {
        self.dir.path().join("runs")
    }

    fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.runs().to_str().unwrap())
    }

    /// Command without an API key in the environment
    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wizardpro"));
        cmd.current_dir(self.dir.path())
            .env("WIZARDPRO_HOME", self.dir.path())
            .env_remove(KEY_ENV)
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        for var in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
            cmd.env_remove(var);
        }
        cmd
    }

    fn cmd_with_key(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env(KEY_ENV, "sk-test");
        cmd
    }
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn saved_run(home: &Home, run_id: &str, edit: impl FnOnce(&mut RunState)) {
    let mut state = RunState::new(run_id, "a todo app");
    edit(&mut state);
    home.store().save(run_id, &state).unwrap();
}

#[test]
fn list_with_no_runs() {
    let home = Home::new();
    home.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs found"));

    let listed = json_stdout(home.cmd().args(["list", "--json"]));
    assert_eq!(listed, json!([]));
}

#[test]
fn list_skips_unreadable_runs() {
    let home = Home::new();
    saved_run(&home, "good", |_| {});
    fs::write(home.runs().join("bad.json"), "{ not json").unwrap();

    let listed = json_stdout(home.cmd().args(["list", "--json"]));
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["run_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["good"]);

    home.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("good").and(predicate::str::contains("Pending")));
}

#[test]
fn status_of_missing_run_exits_3() {
    let home = Home::new();
    home.cmd()
        .args(["status", "nope"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no saved run named 'nope'"));
}

#[test]
fn resume_of_missing_run_exits_3_without_api_key() {
    let home = Home::new();
    home.cmd()
        .args(["resume", "nope", "--input", "hello"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("wizardpro list"));
}

#[test]
fn start_without_api_key_exits_2_and_saves_nothing() {
    let home = Home::new();
    home.cmd()
        .args(["start", "a todo app", "--run-id", "todo"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(KEY_ENV));
    assert!(!home.runs().join("todo.json").exists());
}

#[test]
fn missing_explicit_config_exits_2() {
    let home = Home::new();
    home.cmd()
        .args(["--config", "does-not-exist.toml", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No configuration file exists"));
}

#[test]
fn start_from_empty_stdin_is_rejected() {
    let home = Home::new();
    home.cmd_with_key()
        .args(["start", "--run-id", "empty"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("without an initial request"));
    assert!(!home.runs().join("empty.json").exists());
}

#[test]
fn status_shows_summary_and_events() {
    let home = Home::new();
    saved_run(&home, "paused", |state| {
        state.log("Phase1_Requirements", LogLevel::Info, "Gathered requirements", None);
        state.request_input(
            "Phase1_Requirements",
            "Tell me more",
            vec!["Who are the users?".to_string()],
        );
    });

    home.cmd()
        .args(["status", "paused", "--events"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Status:          NeedsUserInput")
                .and(predicate::str::contains("Awaiting input:  Tell me more"))
                .and(predicate::str::contains("Who are the users?"))
                .and(predicate::str::contains("Gathered requirements")),
        );

    let status = json_stdout(home.cmd().args(["status", "paused", "--json", "--events"]));
    assert_eq!(status["status"], "NeedsUserInput");
    assert_eq!(status["pending_prompt"], "Tell me more");
    assert_eq!(status["events"][0]["message"], "Gathered requirements");
}

#[test]
fn resume_of_errored_run_reports_failure_without_api_key() {
    let home = Home::new();
    saved_run(&home, "failed", |state| {
        state.mark_error("Phase2_Architecture", "Architecture call failed", None);
    });

    home.cmd()
        .args(["resume", "failed"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Status:          Error"))
        .stderr(predicate::str::contains("wizardpro status failed --events"));

    let state = home.store().load("failed").unwrap().unwrap();
    assert_eq!(state.status, RunStatus::Error);
    assert!(state.call_history.is_empty());
}

#[test]
fn resume_of_complete_run_is_a_no_op_without_api_key() {
    let home = Home::new();
    saved_run(&home, "done", |state| {
        state.set_status(RunStatus::Complete, Some("Phase5_Deployment"));
    });

    let summary = json_stdout(home.cmd().args(["resume", "done", "--json", "--input", "late"]));
    assert_eq!(summary["status"], "Complete");
    assert_eq!(summary["calls"], 0);

    let state = home.store().load("done").unwrap().unwrap();
    assert!(state.user_feedback.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn start_pauses_for_input_against_http_provider() {
    let server = MockServer::start().await;
    let reply = r#"{"status": "NeedsUserInput", "questions": ["Who are the users?"], "message": "Tell me more"}"#;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": reply}, "finish_reason": "stop"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let home = Home::with_base_url(Some(&format!("{}/v1", server.uri())));
    let mut cmd = home.cmd_with_key();
    cmd.args(["start", "a todo app", "--run-id", "todo", "--wrapper", "security"])
        .env("NO_PROXY", "127.0.0.1,localhost");
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Who are the users?"));
    assert!(stdout.contains("wizardpro resume todo --input"));

    let state = home.store().load("todo").unwrap().unwrap();
    assert_eq!(state.status, RunStatus::NeedsUserInput);
    assert_eq!(state.call_history.len(), 2);
    assert_eq!(state.selected_wrappers, ["security"]);
    assert_runs_dir(&home.runs());
}

fn assert_runs_dir(runs: &Path) {
    let files: Vec<String> = fs::read_dir(runs)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, ["todo.json"]);
}
