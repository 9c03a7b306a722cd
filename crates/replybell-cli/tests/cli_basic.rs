//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with a scratch HOME and explicit config files.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const CONFIG: &str = r#"
verbosity = 0

[notification_modes_by_duration]
"0" = ["tone"]
"10" = ["tone", "desktop_alert"]
"#;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_replybell"))
        .args(args)
        .env("HOME", home)
        .env_remove("REPLYBELL_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_config(dir: &TempDir) -> String {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_resolve_picks_threshold() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let (stdout, _, code) = run_cli(dir.path(), &["resolve", "3", "--config", &config]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "threshold 0s: tone");

    let (stdout, _, code) = run_cli(dir.path(), &["resolve", "12.5", "--config", &config]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "threshold 10s: tone, desktop_alert");
}

#[test]
fn test_resolve_json() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let (stdout, _, code) = run_cli(dir.path(), &["resolve", "10", "--config", &config, "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["threshold_secs"], 10.0);
    assert_eq!(json["actions"], serde_json::json!(["tone", "desktop_alert"]));
}

#[test]
fn test_replay_emits_events_and_dry_run_report() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let scenario = dir.path().join("scenario.toml");
    std::fs::write(
        &scenario,
        r#"
[[steps]]
at_secs = 0
busy = true

[[steps]]
at_secs = 1
busy = true

[[steps]]
at_secs = 3
busy = false
"#,
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["replay", scenario.to_str().unwrap(), "--config", &config],
    );
    assert_eq!(code, 0, "stderr: {stderr}");

    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<String> = records
        .iter()
        .map(|r| match r["kind"].as_str().unwrap() {
            "event" => r["data"]["type"].as_str().unwrap().to_string(),
            other => other.to_string(),
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "MonitorStarted",
            "GenerationStarted",
            "GenerationFinished",
            "dispatch",
            "MonitorStopped"
        ]
    );
    assert_eq!(records[2]["data"]["duration_secs"], 3.0);

    let report = &records[3]["data"];
    assert_eq!(report["threshold_secs"], 0.0);
    assert_eq!(report["outcomes"][0]["action"], "tone");
    assert_eq!(
        report["outcomes"][0]["status"]["Skipped"]["reason"],
        "dry-run mode"
    );
}

#[test]
fn test_config_check_and_get() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let (stdout, _, code) = run_cli(dir.path(), &["config", "check", "--config", &config]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("ok: 2 thresholds"));

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "verbosity", "--config", &config]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "0");
}

#[test]
fn test_config_check_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[notification_modes_by_duration]\n\"0\" = [\"fireworks\"]\n").unwrap();

    let (_, stderr, code) = run_cli(dir.path(), &["config", "check", "--config", path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_config_init_writes_default_and_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.toml");
    let target = path.to_str().unwrap();

    let (_, _, code) = run_cli(dir.path(), &["config", "init", target]);
    assert_eq!(code, 0);
    assert!(std::fs::read_to_string(&path).unwrap().contains("[notification_modes_by_duration]"));

    let (_, _, code) = run_cli(dir.path(), &["config", "init", target]);
    assert_eq!(code, 1);

    let (_, _, code) = run_cli(dir.path(), &["config", "init", target, "--force"]);
    assert_eq!(code, 0);
}

#[test]
fn test_config_path_uses_home() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with(".config/replybell/config.toml"));
}
