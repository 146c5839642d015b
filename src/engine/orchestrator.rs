//! Check execution orchestrator.
//!
//! Manages check registration and strictly sequential execution.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Check panics: Caught via std::panic::catch_unwind, converted to a failed result
//! - Check failure: Never stops the run, every selected check is executed
//! - Unknown check ID in a selection: Reported as `GateError::UnknownCheck`
//! - Empty selection: Reported as `GateError::NoChecksSelected`, never a pass
//!
//! Check *n+1* is started only after check *n* has returned.

use crate::engine::result::{GateReport, ResultAggregator};
use crate::{platform, Check, CheckResult, CheckStatus, GateError};
use std::any::Any;
use std::time::Instant;

/// A registered check with its execution function
pub struct RegisteredCheck {
    pub id: String,
    pub name: String,
    pub description: String,
    pub check_fn: Box<dyn Fn() -> CheckResult + Send + Sync>,
}

/// Gate orchestrator
#[derive(Default)]
pub struct GateOrchestrator {
    checks: Vec<RegisteredCheck>,
}

impl GateOrchestrator {
    /// Create an orchestrator with no checks
    pub fn new() -> Self {
        Self::default()
    }

    /// Register checks for execution
    pub fn register_checks(&mut self, checks: Vec<RegisteredCheck>) {
        self.checks.extend(checks);
    }

    /// Register a single check
    pub fn register_check(&mut self, check: RegisteredCheck) {
        self.checks.push(check);
    }

    /// IDs of all registered checks, in execution order
    pub fn check_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.id.as_str()).collect()
    }

    /// Run all registered checks
    pub fn run_all(&self) -> Result<GateReport, GateError> {
        self.run_filtered(&[], &[])
    }

    /// Run specific checks by ID, in registration order
    pub fn run_specific(&self, check_ids: &[String]) -> Result<GateReport, GateError> {
        self.run_filtered(check_ids, &[])
    }

    /// Run all checks except specified IDs
    pub fn run_excluding(&self, skip_ids: &[String]) -> Result<GateReport, GateError> {
        self.run_filtered(&[], skip_ids)
    }

    /// Run the checks named in `only` (all of them when empty), minus those
    /// named in `skip`. Every id in either list must be registered.
    pub fn run_filtered(&self, only: &[String], skip: &[String]) -> Result<GateReport, GateError> {
        self.ensure_known(only)?;
        self.ensure_known(skip)?;

        let selected = self
            .checks
            .iter()
            .filter(|c| only.is_empty() || only.contains(&c.id))
            .filter(|c| !skip.contains(&c.id))
            .collect();
        self.run_selected(selected)
    }

    fn ensure_known(&self, check_ids: &[String]) -> Result<(), GateError> {
        match check_ids
            .iter()
            .find(|id| !self.checks.iter().any(|c| &c.id == *id))
        {
            Some(id) => Err(GateError::UnknownCheck { id: id.clone() }),
            None => Ok(()),
        }
    }

    /// Execute the selected checks one after another
    fn run_selected(&self, selected: Vec<&RegisteredCheck>) -> Result<GateReport, GateError> {
        if selected.is_empty() {
            return Err(GateError::NoChecksSelected);
        }

        let start = Instant::now();
        let mut aggregator = ResultAggregator::new();

        for check in selected {
            let result = self.execute_check(check);
            aggregator.add_result(Check {
                id: check.id.clone(),
                name: check.name.clone(),
                description: check.description.clone(),
                result,
            });
        }

        let hostname = platform::get_hostname().unwrap_or_else(|| "unknown".to_string());
        aggregator.set_metadata(hostname, start.elapsed().as_millis() as u64);
        Ok(aggregator.into_report())
    }

    /// Execute a single check, converting a panic into a failed result
    fn execute_check(&self, check: &RegisteredCheck) -> CheckResult {
        tracing::info!(check = %check.id, "running check");
        let start = Instant::now();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (check.check_fn)()))
            .unwrap_or_else(|payload| {
                CheckResult::with_status(
                    CheckStatus::Panicked {
                        message: panic_message(payload.as_ref()),
                    },
                    start.elapsed().as_millis() as u64,
                )
            });

        tracing::info!(
            check = %check.id,
            status = %result.status,
            passed = result.passed(),
            duration_ms = result.duration_ms,
            "check finished"
        );
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "check panicked".to_string()
    }
}
