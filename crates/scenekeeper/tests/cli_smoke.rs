//! CLI smoke tests for `sk`.
//!
//! Runs the built binary against temp files and checks exit codes, stable
//! JSON shapes and actionable error output.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sk() -> Command {
    let mut cmd = Command::cargo_bin("sk").expect("sk binary");
    cmd.env_remove("SK_CONFIG")
        .env_remove("SK_LOG_LEVEL")
        .env_remove("SK_LOG_FORMAT")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

// =============================================================================
// opcodes
// =============================================================================

#[test]
fn opcodes_json_lists_the_transaction_table() {
    let output = sk().args(["opcodes", "--json"]).output().expect("run sk");
    assert!(output.status.success());

    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).expect("json rows");
    let by_scb = rows
        .iter()
        .find(|row| row["name"] == "REQUEST_FOCUS_STATUS_BY_SCB")
        .expect("by-scb row");
    assert_eq!(by_scb["code"], 71);
    assert_eq!(by_scb["fire_and_forget"], true);

    let create = rows.iter().find(|row| row["code"] == 0).expect("create row");
    assert_eq!(create["label"], "TRANS_ID_CREATE_AND_CONNECT_SPECIFIC_SESSION");
    assert_eq!(create["reply"], "ws");
}

#[test]
fn opcodes_table_is_plain_text() {
    sk().arg("opcodes")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRANS_ID_BIND_DIALOG_TARGET"))
        .stdout(predicate::str::contains("scb"));
}

// =============================================================================
// check-config
// =============================================================================

#[test]
fn check_config_without_a_file_prints_defaults() {
    sk().arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[queue]"))
        .stderr(predicate::str::contains("showing defaults"));
}

#[test]
fn check_config_accepts_a_valid_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "scenekeeper.toml",
        "[queue]\ncapacity = 8\n\n[focus]\nauto_focus_on_foreground = false\n",
    );
    sk().arg("check-config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("capacity = 8"))
        .stdout(predicate::str::contains("auto_focus_on_foreground = false"));
}

#[test]
fn check_config_rejects_invalid_values_with_a_hint() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "bad.toml", "[queue]\ncapacity = 0\n");
    sk().arg("check-config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("queue.capacity"))
        .stderr(predicate::str::contains("To fix:"));
}

#[test]
fn check_config_reports_a_missing_file() {
    sk().args(["check-config", "/nonexistent/scenekeeper.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// =============================================================================
// replay
// =============================================================================

const SCENARIO: &str = r#"
[[step]]
action = "create"
name = "mail"
z = 1

[[step]]
action = "create"
name = "editor"
z = 2

[[step]]
action = "foreground"
window = "mail"

[[step]]
action = "foreground"
window = "editor"

[[step]]
action = "create"
name = "find"
window_type = "app_sub_window"
parent = "editor"
z = 3

[[step]]
action = "unfocus"
window = "find"

[[step]]
action = "destroy"
window = "find"

[[step]]
action = "set-visibility"
window = "editor"
visibility = "total_occlusion"
"#;

#[test]
fn replay_reports_focus_and_sessions_as_json() {
    let dir = TempDir::new().expect("temp dir");
    let script = write_file(&dir, "scenario.toml", SCENARIO);

    let output = sk()
        .arg("replay")
        .arg(&script)
        .arg("--json")
        .output()
        .expect("run sk");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    let steps = report["steps"].as_array().expect("steps");
    assert_eq!(steps.len(), 8);
    assert!(steps.iter().all(|step| step["code"] == 0), "{steps:?}");

    // Focus went find -> editor -> mail as the sub window let go and the
    // editor was occluded.
    assert_eq!(report["focused"], "mail");
    assert_eq!(report["sessions"].as_array().expect("sessions").len(), 2);
    assert!(report["windows"]["find"].is_i64());
}

#[test]
fn replay_plain_output_names_the_holder() {
    let dir = TempDir::new().expect("temp dir");
    let script = write_file(&dir, "scenario.toml", SCENARIO);
    sk().arg("replay")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("focused: mail"));
}

#[test]
fn replay_fails_on_an_unknown_window() {
    let dir = TempDir::new().expect("temp dir");
    let script = write_file(
        &dir,
        "broken.toml",
        "[[step]]\naction = \"background\"\nwindow = \"ghost\"\n",
    );
    sk().arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown window 'ghost'"));
}
