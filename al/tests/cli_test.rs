//! Command-line behavior of the agentloop binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run the binary with HOME and the working directory inside `temp`
fn agentloop(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agentloop").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_DATA_HOME", temp.path().join("data"))
        .env("XDG_CONFIG_HOME", temp.path().join("config"));
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    agentloop(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("Logs are written to"));
}

#[test]
fn test_tools_lists_builtins() {
    let temp = TempDir::new().unwrap();
    agentloop(&temp)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("file_management"))
        .stdout(predicate::str::contains("project_scaffold"));
}

#[test]
fn test_tools_json_uses_input_schema() {
    let temp = TempDir::new().unwrap();
    let output = agentloop(&temp).args(["tools", "--json"]).output().unwrap();
    assert!(output.status.success());

    let tools: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tools = tools.as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert!(tools.iter().all(|t| t["input_schema"]["type"] == "object"));
}

#[test]
fn test_config_prints_local_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(".agentloop.yml"),
        "orchestration:\n  max-loops: 7\nllm:\n  provider: gemini\n",
    )
    .unwrap();

    agentloop(&temp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max-loops: 7"))
        .stdout(predicate::str::contains("provider: gemini"));
}

#[test]
fn test_run_without_api_key_fails() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("agentloop.yml"),
        "llm:\n  anthropic:\n    api-key-env: AGENTLOOP_CLI_TEST_UNSET_KEY\n",
    )
    .unwrap();

    agentloop(&temp)
        .args(["run", "Say hello", "-c", "agentloop.yml"])
        .env_remove("AGENTLOOP_CLI_TEST_UNSET_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));

    assert!(!temp.path().join("workspace").exists());
}

#[test]
fn test_run_rejects_malformed_param() {
    let temp = TempDir::new().unwrap();
    agentloop(&temp)
        .args(["run", "task", "-p", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}
