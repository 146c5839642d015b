//! Result aggregation and the gate decision.
//!
//! Collects check results, generates summaries, and reduces them to a single
//! pass/fail verdict.

use crate::{Check, FAIL_MESSAGE, PASS_MESSAGE, SUCCESS_CODE};
use serde::Serialize;
use std::fmt;

/// Process exit code when the gate passes
pub const EXIT_PASSED: i32 = 0;

/// Process exit code when the gate fails
pub const EXIT_FAILED: i32 = 1;

/// Result summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub passed: u32,
    pub failed: u32,
    pub total: u32,
    pub total_duration_ms: u64,
}

/// Final verdict of a gate run.
///
/// Deterministic in the check results: the gate passes if and only if at
/// least one check ran and every check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub passed: bool,
}

impl GateDecision {
    /// Decide from raw status codes.
    pub fn from_codes<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut any = false;
        let mut all = true;
        for code in codes {
            any = true;
            all &= code == SUCCESS_CODE;
        }
        GateDecision { passed: any && all }
    }

    /// Decide from executed checks.
    pub fn from_checks(checks: &[Check]) -> Self {
        GateDecision {
            passed: !checks.is_empty() && checks.iter().all(Check::passed),
        }
    }

    /// The verdict line printed on stdout
    pub fn message(&self) -> &'static str {
        if self.passed {
            PASS_MESSAGE
        } else {
            FAIL_MESSAGE
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Gate report containing all check results
#[derive(Debug, Clone, Serialize)]
pub struct GateReport {
    pub timestamp: u64,
    pub hostname: String,
    pub checks: Vec<Check>,
    pub total_duration_ms: u64,
}

impl GateReport {
    /// Calculate summary statistics
    pub fn summary(&self) -> ResultSummary {
        let mut summary = ResultSummary::default();

        for check in &self.checks {
            summary.total += 1;
            summary.total_duration_ms += check.result.duration_ms;
            if check.passed() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
        }

        summary
    }

    pub fn decision(&self) -> GateDecision {
        GateDecision::from_checks(&self.checks)
    }
}

/// Result aggregator for collecting check results
#[derive(Debug, Default)]
pub struct ResultAggregator {
    checks: Vec<Check>,
    hostname: String,
    total_duration_ms: u64,
}

impl ResultAggregator {
    /// Create a new result aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Set report metadata
    pub fn set_metadata(&mut self, hostname: String, total_duration_ms: u64) {
        self.hostname = hostname;
        self.total_duration_ms = total_duration_ms;
    }

    /// Add a completed check result
    pub fn add_result(&mut self, check: Check) {
        self.checks.push(check);
    }

    /// Create final gate report
    pub fn into_report(self) -> GateReport {
        GateReport {
            timestamp: crate::platform::get_unix_timestamp(),
            hostname: self.hostname,
            checks: self.checks,
            total_duration_ms: self.total_duration_ms,
        }
    }
}
