//! CLI integration tests.
//!
//! These tests exercise the CLI commands end-to-end against a temporary
//! configuration directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Get the path to the confvault binary.
fn binary_path() -> &'static str {
    env!("CARGO_BIN_EXE_confvault")
}

/// Run confvault against `root` with an isolated home directory.
fn confvault(root: &Path, home: &Path, args: &[&str]) -> Output {
    Command::new(binary_path())
        .arg("--root")
        .arg(root)
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CONFVAULT_ROOT")
        .env_remove("CONFVAULT_CONFIG_CONTENT")
        .env_remove("CONFVAULT_ENABLED")
        .env_remove("CONFVAULT_MAX_REVISIONS")
        .env_remove("CONFVAULT_AUTO_CLEANUP")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Output is not JSON")
}

fn setup() -> (TempDir, TempDir) {
    let root = TempDir::new().expect("Failed to create temp dir");
    let home = TempDir::new().expect("Failed to create temp dir");
    (root, home)
}

#[test]
fn test_help_command() {
    let output = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rollback"));
    assert!(stdout.contains("checkpoint") || stdout.contains("batch"));
}

#[test]
fn test_init_is_idempotent() {
    let (root, home) = setup();

    let first = json(&confvault(root.path(), home.path(), &["--json", "init"]));
    assert_eq!(first["created"], true);
    assert!(root.path().join(".git").exists());

    let second = json(&confvault(root.path(), home.path(), &["--json", "init"]));
    assert_eq!(second["created"], false);
}

#[test]
fn test_commit_history_and_noop() {
    let (root, home) = setup();
    fs::write(root.path().join("automations.yaml"), "[]\n").unwrap();

    let commit = json(&confvault(
        root.path(),
        home.path(),
        &["--json", "commit", "-m", "add automations"],
    ));
    assert!(commit["revision_id"].is_string());

    let noop = json(&confvault(root.path(), home.path(), &["--json", "commit", "-m", "noop"]));
    assert!(noop["revision_id"].is_null());

    let history = json(&confvault(root.path(), home.path(), &["--json", "history"]));
    let revisions = history["revisions"].as_array().unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0]["message"], "add automations");
    assert_eq!(revisions[0]["files_changed"], 1);
}

#[test]
fn test_rollback_and_undo() {
    let (root, home) = setup();
    let file = root.path().join("configuration.yaml");

    fs::write(&file, "name: Home\n").unwrap();
    let first = json(&confvault(root.path(), home.path(), &["--json", "commit", "-m", "v1"]));
    let v1 = first["revision_id"].as_str().unwrap().to_string();

    fs::write(&file, "name: Cabin\n").unwrap();
    let rollback = json(&confvault(root.path(), home.path(), &["--json", "rollback", &v1[..8]]));
    assert_eq!(fs::read_to_string(&file).unwrap(), "name: Home\n");

    let safety = rollback["safety_revision_id"].as_str().unwrap().to_string();
    json(&confvault(root.path(), home.path(), &["--json", "rollback", &safety]));
    assert_eq!(fs::read_to_string(&file).unwrap(), "name: Cabin\n");
}

#[test]
fn test_restore_and_status() {
    let (root, home) = setup();
    fs::write(root.path().join("a.yaml"), "a1\n").unwrap();
    fs::write(root.path().join("b.yaml"), "b1\n").unwrap();
    let first = json(&confvault(root.path(), home.path(), &["--json", "commit", "-m", "v1"]));
    let v1 = first["revision_id"].as_str().unwrap().to_string();

    fs::write(root.path().join("a.yaml"), "a2\n").unwrap();
    fs::write(root.path().join("b.yaml"), "b2\n").unwrap();

    let status = json(&confvault(root.path(), home.path(), &["--json", "status"]));
    assert_eq!(status["changed_paths"].as_array().unwrap().len(), 2);

    let restore = json(&confvault(
        root.path(),
        home.path(),
        &["--json", "restore", &v1, "a.yaml"],
    ));
    assert_eq!(restore["restored_paths"], serde_json::json!(["a.yaml"]));
    assert_eq!(fs::read_to_string(root.path().join("a.yaml")).unwrap(), "a1\n");
    assert_eq!(fs::read_to_string(root.path().join("b.yaml")).unwrap(), "b2\n");
}

#[test]
fn test_cleanup_reports_pruned_count() {
    let (root, home) = setup();
    for i in 0..4 {
        fs::write(root.path().join("counter.yaml"), format!("{i}\n")).unwrap();
        let output = confvault(root.path(), home.path(), &["commit", "-m", "tick"]);
        assert!(output.status.success());
    }

    let cleanup = json(&confvault(root.path(), home.path(), &["--json", "cleanup", "--max", "2"]));
    assert_eq!(cleanup["pruned_count"], 3);

    let history = json(&confvault(root.path(), home.path(), &["--json", "history"]));
    assert_eq!(history["revisions"].as_array().unwrap().len(), 2);
}

#[test]
fn test_check_path_rejects_traversal() {
    let (root, home) = setup();

    let output = confvault(root.path(), home.path(), &["check-path", "../../etc/passwd"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside"));

    let ok = json(&confvault(
        root.path(),
        home.path(),
        &["--json", "check-path", "packages/lights.yaml"],
    ));
    assert!(ok["path"].as_str().unwrap().ends_with("lights.yaml"));
}

#[test]
fn test_settings_from_env_content() {
    let (root, home) = setup();
    let output = Command::new(binary_path())
        .args(["--json", "init"])
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("CONFVAULT_ROOT", root.path())
        .env("CONFVAULT_CONFIG_CONTENT", r#"{"enabled": false}"#)
        .output()
        .expect("Failed to execute command");

    let init = json(&output);
    assert_eq!(init["enabled"], false);
    assert!(!root.path().join(".git").exists());
}

#[cfg(unix)]
#[test]
fn test_batch_commits_once() {
    let (root, home) = setup();

    let batch = json(&confvault(
        root.path(),
        home.path(),
        &[
            "--json",
            "batch",
            "-d",
            "install lights",
            "--",
            "sh",
            "-c",
            "echo a > a.yaml && echo b > b.yaml && echo c > c.yaml",
        ],
    ));
    assert!(batch["revision_id"].is_string());

    let history = json(&confvault(root.path(), home.path(), &["--json", "history"]));
    let revisions = history["revisions"].as_array().unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0]["message"], "install lights (3 files changed)");
}

#[cfg(unix)]
#[test]
fn test_batch_failure_leaves_changes_uncommitted() {
    let (root, home) = setup();

    let output = confvault(
        root.path(),
        home.path(),
        &["batch", "-d", "broken", "--", "sh", "-c", "echo a > a.yaml && exit 3"],
    );
    assert!(!output.status.success());

    let history = json(&confvault(root.path(), home.path(), &["--json", "history"]));
    assert_eq!(history["revisions"].as_array().unwrap().len(), 1);

    let status = json(&confvault(root.path(), home.path(), &["--json", "status"]));
    assert_eq!(status["changed_paths"], serde_json::json!(["a.yaml"]));
}
