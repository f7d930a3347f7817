//! Basic CLI E2E tests.
//!
//! Tests invoke the compiled binary against a throwaway data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tabwarden"))
        .args(args)
        .env("TABWARDEN_DATA_DIR", data_dir)
        .env("TABWARDEN_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Feed JSON lines to `tabwarden run` and collect every output line.
fn run_bridge(data_dir: &Path, input: &[serde_json::Value]) -> Vec<serde_json::Value> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tabwarden"))
        .arg("run")
        .env("TABWARDEN_DATA_DIR", data_dir)
        .env("TABWARDEN_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn bridge");

    {
        let mut stdin = child.stdin.take().unwrap();
        for line in input {
            writeln!(stdin, "{line}").unwrap();
        }
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "bridge exited with {:?}", output.status);
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_status_on_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["focus"]["mode"], "focus");
    assert_eq!(status["focus"]["display"], "25:00");
    assert_eq!(status["destruct"]["phase"], "idle");
    assert_eq!(status["lockdown"]["active"], false);
}

#[test]
fn test_lockdown_requires_cap() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["lockdown", "for", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Please set max tabs first"));

    let (code, _, _) = run_cli(dir.path(), &["tabs", "set-max", "4"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(dir.path(), &["lockdown", "for", "30"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("lockdown_started"));

    let (code, _, stderr) = run_cli(dir.path(), &["tabs", "clear"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("lockdown"));
}

#[test]
fn test_focus_start_and_pause() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["focus", "start", "--mode", "shortBreak"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(dir.path(), &["focus", "pause"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("focus_paused"));

    let (_, stdout, _) = run_cli(dir.path(), &["status"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["focus"]["mode"], "shortBreak");
    assert_eq!(status["focus"]["running"], false);
}

#[test]
fn test_destruct_rejects_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["destruct", "enable", "--secs", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("at least 1 second"));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "destruct.warning_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "focus.focus_minutes", "50"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "focus.focus_minutes"]);
    assert_eq!(stdout.trim(), "50");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "focus.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_activity_list_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["activity", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No activity recorded yet."));
}

#[test]
fn test_bridge_blocks_tab_during_lockdown() {
    let dir = tempfile::tempdir().unwrap();
    let lines = run_bridge(
        dir.path(),
        &[
            serde_json::json!({ "type": "tabs", "tabs": [{ "id": 1 }, { "id": 2 }] }),
            serde_json::json!({ "type": "command", "id": 1, "command": { "action": "setMaxTabs", "max_tabs": 2 } }),
            serde_json::json!({ "type": "command", "id": 2, "command": { "action": "enableLockdownFor", "duration_secs": 600 } }),
            serde_json::json!({ "type": "tab", "event": { "type": "created", "tab": { "id": 3 } } }),
            serde_json::json!({ "type": "command", "id": 3, "command": { "action": "submitIntent", "tab_id": 1, "intent": "docs.rs" } }),
        ],
    );

    let responses: Vec<_> = lines.iter().filter(|l| l["type"] == "response").collect();
    assert_eq!(responses.len(), 3);
    assert!(responses.iter().all(|r| r["response"]["success"] == true));
    assert_eq!(responses[2]["response"]["message"], "https://docs.rs/");

    assert!(lines
        .iter()
        .any(|l| l["type"] == "close_tab" && l["tab_id"] == 3));
    assert!(lines.iter().any(|l| l["type"] == "notify"
        && l["message"] == "Maximum 2 tabs allowed during lockdown"));
    assert!(lines
        .iter()
        .any(|l| l["type"] == "event" && l["event"]["type"] == "tab_blocked"));
}

#[test]
fn test_bridge_reports_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let lines = run_bridge(dir.path(), &[serde_json::json!({ "type": "launch" })]);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["type"], "error");
}
