//! ci-gate library
//!
//! Sequential pipeline gate for continuous integration.
//!
//! The gate runs a list of external checks one after another, records how
//! each of them terminated, and reduces the results with logical AND:
//! the pipeline passes only if every check exited with status `0`.
//!
//! This library provides:
//! - External check execution with optional timeout and output capture
//! - Layered TOML configuration (defaults, file, environment, CLI)
//! - Strictly sequential orchestration with no early exit
//! - Text, JSON and JUnit XML reporting
//!
//! # Example
//!
//! ```no_run
//! use ci_gate::{run_gate, RunConfig};
//!
//! let report = run_gate(RunConfig::default()).expect("gate could not run");
//! println!("{}", report.decision().message());
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod logging;
pub mod platform;
pub mod version;

use cli::args::Args;
use config::{CliOverrides, ConfigError, GateConfig};
use engine::orchestrator::GateOrchestrator;
use engine::result::GateReport;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// Re-exports for public API
pub use engine::result::{GateDecision, ResultSummary};

/// Status code that denotes a passing check.
pub const SUCCESS_CODE: i32 = 0;

/// Verdict printed when every check passed.
pub const PASS_MESSAGE: &str = "All checks have passed!";

/// Verdict printed when at least one check did not pass.
pub const FAIL_MESSAGE: &str = "Some checks have not passed!";

/// How a check terminated.
///
/// Only `Exited { code: 0 }` counts as a pass. Every other variant, including
/// crashes and launch failures, is a failure of the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckStatus {
    /// The process exited normally with a status code
    Exited { code: i32 },
    /// The process was terminated by a signal
    Terminated { signal: Option<i32> },
    /// The program could not be started
    LaunchFailed { reason: String },
    /// The process exceeded its timeout and was killed
    TimedOut { timeout_ms: u64 },
    /// An in-process check panicked
    Panicked { message: String },
}

impl CheckStatus {
    /// Whether this status is the success sentinel.
    pub fn passed(&self) -> bool {
        matches!(self, CheckStatus::Exited { code } if *code == SUCCESS_CODE)
    }

    /// The exit code, if the process exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            CheckStatus::Exited { code } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Exited { code } => write!(f, "exit code {}", code),
            CheckStatus::Terminated { signal: Some(signal) } => {
                write!(f, "terminated by signal {}", signal)
            }
            CheckStatus::Terminated { signal: None } => write!(f, "terminated"),
            CheckStatus::LaunchFailed { reason } => write!(f, "failed to launch: {}", reason),
            CheckStatus::TimedOut { timeout_ms } => write!(f, "timed out after {}ms", timeout_ms),
            CheckStatus::Panicked { message } => write!(f, "panicked: {}", message),
        }
    }
}

/// Outcome of one executed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub duration_ms: u64,
    /// Captured stdout (tail), when capture is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured stderr (tail), when capture is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl CheckResult {
    /// Result for a process that exited with `code`.
    pub fn exited(code: i32, duration_ms: u64) -> Self {
        Self::with_status(CheckStatus::Exited { code }, duration_ms)
    }

    /// Result with no captured output.
    pub fn with_status(status: CheckStatus, duration_ms: u64) -> Self {
        CheckResult {
            status,
            duration_ms,
            stdout: None,
            stderr: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.status.passed()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "PASS: {}", self.status)
        } else {
            write!(f, "FAIL: {}", self.status)
        }
    }
}

/// An executed gate check.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    /// Unique identifier (e.g., "workspace")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of what this check verifies
    pub description: String,
    pub result: CheckResult,
}

impl Check {
    /// A check only passes if it exited with the success code.
    pub fn passed(&self) -> bool {
        self.result.passed()
    }
}

/// Errors of the gate itself.
///
/// A failing check is not an error: it is recorded in the report and turned
/// into the failing verdict.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No checks selected to run")]
    NoChecksSelected,

    #[error("Unknown check id: '{id}'")]
    UnknownCheck { id: String },
}

/// Options for a single gate run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory that config files and relative paths are resolved against
    pub root: PathBuf,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    /// Specific checks to run (by ID)
    pub only_checks: Vec<String>,
    /// Specific checks to skip (by ID)
    pub skip_checks: Vec<String>,
    /// Overrides applied on top of the file configuration
    pub overrides: CliOverrides,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            root: PathBuf::from("."),
            config_path: None,
            only_checks: Vec::new(),
            skip_checks: Vec::new(),
            overrides: CliOverrides::default(),
        }
    }
}

impl RunConfig {
    /// Create a run configuration from command line arguments
    pub fn from_args(args: &Args) -> Self {
        RunConfig {
            root: args.root.clone().unwrap_or_else(|| PathBuf::from(".")),
            config_path: args.config.clone(),
            only_checks: args.only.clone(),
            skip_checks: args.skip.clone(),
            overrides: CliOverrides {
                timeout_ms: args.timeout_ms,
                capture_output: args.capture.then_some(true),
            },
        }
    }

    /// Resolve the layered gate configuration for this run.
    pub fn load_config(&self) -> Result<GateConfig, ConfigError> {
        GateConfig::load(&self.root, self.config_path.as_deref(), Some(&self.overrides))
    }
}

/// Run the gate.
///
/// Loads the configuration, registers every configured check and runs the
/// selected ones sequentially. `only_checks` (when non-empty) narrows the
/// selection and `skip_checks` is then removed from it. Failing checks are reported in the returned
/// `GateReport`; only problems with the gate itself produce a `GateError`.
///
/// # Example
///
/// ```no_run
/// use ci_gate::{run_gate, RunConfig};
///
/// let config = RunConfig {
///     only_checks: vec!["workspace".to_string()],
///     ..Default::default()
/// };
///
/// match run_gate(config) {
///     Ok(report) => std::process::exit(report.decision().exit_code()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_gate(config: RunConfig) -> Result<GateReport, GateError> {
    let gate_config = config.load_config()?;

    let mut orchestrator = GateOrchestrator::new();
    orchestrator.register_checks(checks::create_checks(&gate_config, &config.root));

    orchestrator.run_filtered(&config.only_checks, &config.skip_checks)
}
