//! End-to-end runs of the `ci-gate` binary.
//!
//! stdout must carry the verdict line and nothing else, whatever the
//! checks print.

#![cfg(unix)]

use crate::mocks::{process_lock, GateRepo};
use ci_gate::{FAIL_MESSAGE, PASS_MESSAGE};
use std::process::{Command, Output};

const GATE_ENV: [&str; 7] = [
    "NO_COLOR",
    "CI_GATE_FORMAT",
    "CI_GATE_VERBOSE",
    "CI_GATE_CONFIG",
    "CI_GATE_TIMEOUT_MS",
    "CI_GATE_LOG",
    "RUST_LOG",
];

fn gate(repo: &GateRepo, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ci-gate"));
    command.arg("--root").arg(repo.root()).args(args);
    for name in GATE_ENV {
        command.env_remove(name);
    }
    command.output().expect("run ci-gate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_binary_scenarios() {
    let _lock = process_lock();
    let cases = [
        (0, 0, PASS_MESSAGE, 0),
        (0, 1, FAIL_MESSAGE, 1),
        (1, 0, FAIL_MESSAGE, 1),
        (1, 1, FAIL_MESSAGE, 1),
    ];

    for (workspace, examples, message, code) in cases {
        let repo = GateRepo::with_pipeline_scripts(workspace, examples);
        let output = gate(&repo, &[]);

        assert_eq!(stdout(&output), format!("{}\n", message));
        assert_eq!(output.status.code(), Some(code));
    }
}

#[test]
fn test_check_output_goes_to_stderr() {
    let _lock = process_lock();
    let repo = GateRepo::with_pipeline_scripts(0, 0);
    let output = gate(&repo, &[]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("workspace check output"));
    assert!(stderr.contains("examples check output"));
    assert!(!stdout(&output).contains("check output"));
}

#[test]
fn test_verbose_output_ends_with_verdict() {
    let _lock = process_lock();
    let repo = GateRepo::with_pipeline_scripts(0, 7);
    let output = gate(&repo, &["--verbose", "--no-color"]);

    let text = stdout(&output);
    assert!(text.contains("exit code 7"));
    assert_eq!(text.lines().last(), Some(FAIL_MESSAGE));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_missing_scripts_fail_the_gate() {
    let _lock = process_lock();
    let repo = GateRepo::new();
    let output = gate(&repo, &[]);

    assert_eq!(stdout(&output), format!("{}\n", FAIL_MESSAGE));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_bad_argument_is_a_runtime_error() {
    let _lock = process_lock();
    let repo = GateRepo::new();
    let output = gate(&repo, &["--bogus"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--bogus"));
}

#[test]
fn test_unknown_check_is_a_runtime_error() {
    let _lock = process_lock();
    let repo = GateRepo::with_pipeline_scripts(0, 0);
    let output = gate(&repo, &["--only", "docs"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_skip_with_only_is_a_runtime_error() {
    let _lock = process_lock();
    let repo = GateRepo::with_pipeline_scripts(0, 0);
    let output = gate(&repo, &["--only", "workspace", "--skip", "typo"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("typo"));
}

#[test]
fn test_list_does_not_run_checks() {
    let _lock = process_lock();
    let repo = GateRepo::new();
    repo.write_script("scripts/check-workspace.sh", "touch ran.marker");
    let output = gate(&repo, &["list"]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("workspace"));
    assert!(text.contains("check-examples.sh"));
    assert!(!repo.path("ran.marker").exists());
}

#[test]
fn test_version_command() {
    let _lock = process_lock();
    let repo = GateRepo::new();
    let output = gate(&repo, &["version"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with(&format!("ci-gate {}", env!("CARGO_PKG_VERSION"))));
}
