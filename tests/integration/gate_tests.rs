//! Gate orchestration tests.
//!
//! The pass/fail scenarios, ordering and idempotence of a gate run, using
//! in-process mock checks.

use crate::mocks::*;
use ci_gate::engine::orchestrator::GateOrchestrator;
use ci_gate::{CheckStatus, GateError, FAIL_MESSAGE, PASS_MESSAGE};

#[test]
fn test_both_pass() {
    let report = pipeline_gate(0, 0).run_all().unwrap();
    let decision = report.decision();
    assert!(decision.passed);
    assert_eq!(decision.message(), PASS_MESSAGE);
    assert_eq!(decision.exit_code(), 0);
}

#[test]
fn test_examples_fail() {
    let decision = pipeline_gate(0, 1).run_all().unwrap().decision();
    assert!(!decision.passed);
    assert_eq!(decision.message(), FAIL_MESSAGE);
    assert_eq!(decision.exit_code(), 1);
}

#[test]
fn test_workspace_fail() {
    let decision = pipeline_gate(1, 0).run_all().unwrap().decision();
    assert!(!decision.passed);
    assert_eq!(decision.message(), FAIL_MESSAGE);
    assert_eq!(decision.exit_code(), 1);
}

#[test]
fn test_both_fail() {
    let decision = pipeline_gate(1, 1).run_all().unwrap().decision();
    assert!(!decision.passed);
    assert_eq!(decision.message(), FAIL_MESSAGE);
    assert_eq!(decision.exit_code(), 1);
}

#[test]
fn test_any_nonzero_code_fails() {
    for code in [2, 127, 255, -1] {
        let decision = pipeline_gate(0, code).run_all().unwrap().decision();
        assert!(!decision.passed, "code {} must fail the gate", code);
    }
}

#[test]
fn test_second_check_runs_after_first_fails() {
    let log = CallLog::new();
    let mut orchestrator = GateOrchestrator::new();
    orchestrator.register_check(recording_check("workspace", 1, &log));
    orchestrator.register_check(recording_check("examples", 0, &log));

    let report = orchestrator.run_all().unwrap();
    assert_eq!(log.started(), vec!["workspace", "examples"]);
    assert_eq!(report.checks.len(), 2);
    assert!(report.checks[1].passed());
}

#[test]
fn test_checks_never_interleave() {
    let log = CallLog::new();
    let mut orchestrator = GateOrchestrator::new();
    orchestrator.register_check(recording_check("workspace", 0, &log));
    orchestrator.register_check(recording_check("examples", 0, &log));

    orchestrator.run_all().unwrap();
    assert_eq!(
        log.events(),
        vec![
            CallEvent::Started("workspace".to_string()),
            CallEvent::Finished("workspace".to_string()),
            CallEvent::Started("examples".to_string()),
            CallEvent::Finished("examples".to_string()),
        ]
    );
}

#[test]
fn test_repeated_runs_give_same_verdict() {
    for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let orchestrator = pipeline_gate(a, b);
        let first = orchestrator.run_all().unwrap();
        let second = orchestrator.run_all().unwrap();
        assert_eq!(first.decision(), second.decision());
        assert_eq!(first.summary().passed, second.summary().passed);
        assert_eq!(first.checks.len(), second.checks.len());
    }
}

#[test]
fn test_crash_propagates_as_failure() {
    let mut orchestrator = GateOrchestrator::new();
    orchestrator.register_check(panicking_check("workspace"));
    orchestrator.register_check(passing_check("examples"));

    let report = orchestrator.run_all().unwrap();
    assert!(matches!(
        report.checks[0].result.status,
        CheckStatus::Panicked { .. }
    ));
    assert!(report.checks[1].passed());
    assert_eq!(report.decision().message(), FAIL_MESSAGE);
}

#[test]
fn test_abnormal_terminations_fail() {
    let statuses = [
        CheckStatus::Terminated { signal: Some(9) },
        CheckStatus::Terminated { signal: None },
        CheckStatus::LaunchFailed {
            reason: "No such file or directory".to_string(),
        },
        CheckStatus::TimedOut { timeout_ms: 1000 },
    ];

    for status in statuses {
        let mut orchestrator = GateOrchestrator::new();
        orchestrator.register_check(passing_check("workspace"));
        orchestrator.register_check(status_check("examples", status.clone()));
        let decision = orchestrator.run_all().unwrap().decision();
        assert!(!decision.passed, "{:?} must fail the gate", status);
        assert_eq!(decision.exit_code(), 1);
    }
}

#[test]
fn test_only_selects_checks() {
    let report = pipeline_gate(0, 1)
        .run_specific(&["workspace".to_string()])
        .unwrap();
    assert_eq!(report.checks.len(), 1);
    assert!(report.decision().passed);
}

#[test]
fn test_skip_excludes_checks() {
    let report = pipeline_gate(0, 1)
        .run_excluding(&["examples".to_string()])
        .unwrap();
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].id, "workspace");
    assert!(report.decision().passed);
}

#[test]
fn test_skipping_everything_is_an_error() {
    let result = pipeline_gate(0, 0).run_excluding(&["workspace".to_string(), "examples".to_string()]);
    assert!(matches!(result, Err(GateError::NoChecksSelected)));
}

#[test]
fn test_unknown_only_id_is_an_error() {
    let result = pipeline_gate(0, 0).run_specific(&["docs".to_string()]);
    assert!(matches!(result, Err(GateError::UnknownCheck { .. })));
}

#[test]
fn test_report_metadata() {
    let report = pipeline_gate(0, 0).run_all().unwrap();
    assert!(!report.hostname.is_empty());
    assert!(report.timestamp > 0);
    let summary = report.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.total_duration_ms, 10);
}

#[test]
fn test_only_and_skip_together() {
    let orchestrator = pipeline_gate(0, 1);

    let result = orchestrator.run_filtered(&["workspace".to_string()], &["typo".to_string()]);
    assert!(matches!(result, Err(GateError::UnknownCheck { id }) if id == "typo"));

    let result = orchestrator.run_filtered(&["workspace".to_string()], &["workspace".to_string()]);
    assert!(matches!(result, Err(GateError::NoChecksSelected)));

    let report = orchestrator
        .run_filtered(&["workspace".to_string(), "examples".to_string()], &["examples".to_string()])
        .unwrap();
    assert_eq!(report.checks.len(), 1);
    assert!(report.decision().passed);
}
