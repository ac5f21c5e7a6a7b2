//! End-to-end runs of the `suitegate` binary against script suites.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};

use serial_test::serial;
use tempfile::{tempdir, TempDir};

fn write_suite(build: &Path, name: &str, body: &str) {
    let tests = build.join("tests");
    fs::create_dir_all(&tests).unwrap();
    let path = tests.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn write_plan(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("plan.json");
    fs::write(&path, json).unwrap();
    path
}

fn suitegate(workspace: &TempDir, extra: &[&str]) -> Output {
    let root = workspace.path();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_suitegate"));
    cmd.env_remove("SUITEGATE_BUILD_DIR")
        .env_remove("SUITEGATE_PROJECT_ROOT")
        .env_remove("SUITEGATE_BASELINE")
        .env_remove("SUITEGATE_PLAN")
        .env("RUST_LOG", "warn")
        .arg("--build-dir")
        .arg(root.join("build"))
        .arg("--project-root")
        .arg(root)
        .arg("--plan")
        .arg(root.join("plan.json"))
        .args(extra);
    cmd.output().expect("run suitegate")
}

const PLAN: &str = r#"[
    {"name": "P1: Core Logic", "executable": "core_test"},
    {"name": "P3: Performance & Edge", "executable": "perf_test",
     "blocking": false, "check_performance": true}
]"#;

#[test]
#[serial]
fn all_passing_exits_zero_and_writes_report() {
    let ws = tempdir().unwrap();
    let build = ws.path().join("build");
    write_suite(&build, "core_test", "echo core ok");
    write_suite(&build, "perf_test", "echo 'SHA3-256: 1000 iterations in 8ms'");
    write_plan(ws.path(), PLAN);
    let report = ws.path().join("out").join("report.json");

    let output = suitegate(&ws, &["--report", report.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert!(stdout.contains("=== Running Suite: P1: Core Logic ==="));
    assert!(stdout.contains("  core ok"));
    assert!(stdout.contains("Baseline file not found"));
    assert!(stdout.contains("✓ SHA3-256 Speed: 8ms <= 10ms"));
    assert!(stdout.contains("BUILD SUCCESS"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["verdict"], "SUCCESS");
    assert_eq!(json["baseline_missing"], true);
    assert_eq!(json["outcomes"].as_array().unwrap().len(), 2);
}

#[test]
#[serial]
fn blocking_failure_exits_one() {
    let ws = tempdir().unwrap();
    let build = ws.path().join("build");
    write_suite(&build, "core_test", "echo 'expected 1 got 2' >&2\nexit 1");
    write_suite(&build, "perf_test", "exit 0");
    write_plan(ws.path(), PLAN);

    let output = suitegate(&ws, &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("  expected 1 got 2"));
    assert!(stdout.contains("✗ Suite P1: Core Logic FAILED (Exit Code: 1)"));
    assert!(stdout.contains("BUILD FAILED"));
}

#[test]
#[serial]
fn regression_is_unstable_and_exits_zero() {
    let ws = tempdir().unwrap();
    let build = ws.path().join("build");
    write_suite(&build, "core_test", "exit 0");
    write_suite(&build, "perf_test", "echo 'PBKDF2: 1000 iterations in 200ms'");
    write_plan(ws.path(), PLAN);
    let baseline = ws.path().join("baseline.json");
    fs::write(&baseline, r#"{"hash_computation": {"pbkdf2_max_ms": 100}}"#).unwrap();

    let output = suitegate(&ws, &["--baseline", baseline.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert!(stdout.contains("✗ PBKDF2 Speed: 200ms > 150ms (Regression!)"));
    assert!(stdout.contains("BUILD UNSTABLE"));
}

#[test]
#[serial]
fn missing_blocking_executable_fails() {
    let ws = tempdir().unwrap();
    let build = ws.path().join("build");
    write_suite(&build, "perf_test", "exit 0");
    write_plan(ws.path(), PLAN);

    let output = suitegate(&ws, &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("Executable not found"));
}

#[test]
#[serial]
fn malformed_baseline_aborts_before_running() {
    let ws = tempdir().unwrap();
    let build = ws.path().join("build");
    let marker = ws.path().join("ran.marker");
    write_suite(&build, "core_test", &format!("touch '{}'", marker.display()));
    write_suite(&build, "perf_test", "exit 0");
    write_plan(ws.path(), PLAN);
    let data = ws.path().join("tests").join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("performance_baseline.json"), "{ not json").unwrap();

    let output = suitegate(&ws, &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Failed to load performance baselines"), "stderr: {stderr}");
    assert!(!marker.exists());
}
