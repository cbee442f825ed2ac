// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn analogcast() -> Command {
    Command::cargo_bin("analogcast").expect("analogcast binary")
}

fn parse_commands_from_help(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut in_commands = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed == "Commands:" {
            in_commands = true;
            continue;
        }
        if in_commands {
            if trimmed.is_empty() {
                break;
            }
            let name = trimmed.split_whitespace().next().unwrap_or("");
            if !name.is_empty() && name != "help" {
                commands.push(name.to_string());
            }
        }
    }
    commands.sort();
    commands
}

#[test]
fn help_command_surface_is_stable() {
    let output = analogcast().arg("--help").output().expect("run help");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8 help");
    assert_eq!(
        parse_commands_from_help(&text),
        vec![
            "completion",
            "config",
            "dtw",
            "forecast",
            "latest",
            "matches",
            "snapshot"
        ]
    );
    assert!(text.contains("ANALOGCAST_LOG_LEVEL"));
}

#[test]
fn version_output_contains_crate_version() {
    analogcast()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_returns_usage_exit_code_with_machine_error() {
    let output = analogcast()
        .args(["--json", "--unknown-flag"])
        .output()
        .expect("run bad cli");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let error: Value = serde_json::from_str(stderr.trim()).expect("machine error json");
    assert_eq!(error["code"], "usage_error");
}

#[test]
fn missing_command_is_a_usage_error() {
    analogcast()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing command"));
}

#[test]
fn dtw_prints_distance_and_optional_path() {
    let output = analogcast()
        .args(["--json", "dtw", "--a", "1,2,3", "--b", "1,2,2,3"])
        .output()
        .expect("run dtw");
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(payload["distance"], 0.0);
    assert!(payload.get("path").is_none());

    let output = analogcast()
        .args(["--json", "dtw", "--a", "0,0", "--b", "1,1", "--path"])
        .output()
        .expect("run dtw path");
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(payload["distance"], 2.0);
    assert_eq!(payload["path"], serde_json::json!([[0, 0], [1, 1]]));
}

#[test]
fn dtw_rejects_non_finite_input_as_validation_failure() {
    analogcast()
        .args(["--json", "dtw", "--a", "1,NaN", "--b", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid_input"));
}

#[test]
fn completion_script_is_generated() {
    analogcast()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("analogcast"));
}

#[test]
fn config_reports_defaults_outside_any_workspace() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = analogcast()
        .env_remove("ANALOGCAST_CONFIG")
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .current_dir(tmp.path())
        .args(["--json", "config"])
        .output()
        .expect("run config");
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(payload["source"], "defaults");
    assert_eq!(payload["config"]["k"], 8);
    assert_eq!(payload["config"]["window_length"], 6);
    assert_eq!(payload["config_sha256"].as_str().map(str::len), Some(64));
}

#[test]
fn config_rejects_invalid_documents() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("bad.json");
    std::fs::write(&path, r#"{"k": 0}"#).expect("write config");
    analogcast()
        .arg("--json")
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid_config"));
}
