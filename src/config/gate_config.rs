//! Gate configuration with layered resolution.

use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::checks;

/// Config file looked up in the gate root when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "ci-gate.toml";

/// Environment variable overriding the default per-check timeout.
pub const ENV_TIMEOUT_MS: &str = "CI_GATE_TIMEOUT_MS";

/// Top-level gate configuration.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`CI_GATE_TIMEOUT_MS`)
/// 3. Config file (`--config`, or `ci-gate.toml` in the root)
/// 4. Compiled defaults
///
/// Layers 1 and 2 set gate-wide defaults. A value written on an individual
/// check is more specific and always wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Timeout applied to checks that do not set their own. None = wait forever.
    pub default_timeout_ms: Option<u64>,
    /// Capture check output into the report instead of forwarding it.
    pub capture_output: bool,
    /// Checks to run, in order. Replaces the defaults when present.
    pub checks: Vec<CheckDefinition>,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            default_timeout_ms: None,
            capture_output: false,
            checks: checks::default_definitions(),
        }
    }
}

/// One external check as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDefinition {
    pub id: String,
    /// Display name. Defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Program to execute
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, relative to the gate root
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub capture_output: Option<bool>,
}

impl CheckDefinition {
    /// Minimal definition running `command` with no arguments.
    pub fn new(id: &str, command: &str) -> Self {
        CheckDefinition {
            id: id.to_string(),
            name: None,
            description: String::new(),
            command: command.to_string(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            timeout_ms: None,
            capture_output: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Per-check timeout, falling back to the gate-wide default.
    pub fn effective_timeout_ms(&self, config: &GateConfig) -> Option<u64> {
        self.timeout_ms.or(config.default_timeout_ms)
    }

    /// Per-check capture flag, falling back to the gate-wide default.
    pub fn effective_capture_output(&self, config: &GateConfig) -> bool {
        self.capture_output.unwrap_or(config.capture_output)
    }
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub timeout_ms: Option<u64>,
    pub capture_output: Option<bool>,
}

impl GateConfig {
    /// Load configuration with layered resolution.
    ///
    /// An explicit `config_path` must exist. Without one, `ci-gate.toml` in
    /// `root` is used if present, and the compiled defaults otherwise.
    pub fn load(
        root: &Path,
        config_path: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        // Layers 4 and 3: defaults, then the config file
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let project_config_path = root.join(CONFIG_FILE_NAME);
                if project_config_path.is_file() {
                    Self::from_file(&project_config_path)?
                } else {
                    tracing::debug!(root = %root.display(), "no config file found, using defaults");
                    Self::default()
                }
            }
        };

        // Layer 2: environment variables
        config.apply_env_overrides(|name| env::var(name).ok())?;

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            config.apply_cli_overrides(cli);
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a config file. Keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: GateConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), checks = config.checks.len(), "loaded config file");
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
            let timeout_ms = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT_MS.to_string(),
                message: format!("expected milliseconds, got '{}'", value),
            })?;
            self.default_timeout_ms = Some(timeout_ms);
        }
        Ok(())
    }

    /// Apply CLI overrides.
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(timeout_ms) = cli.timeout_ms {
            self.default_timeout_ms = Some(timeout_ms);
        }
        if let Some(capture_output) = cli.capture_output {
            self.capture_output = capture_output;
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checks.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "checks".to_string(),
                message: "at least one check must be configured".to_string(),
            });
        }

        if self.default_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "default_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for check in &self.checks {
            if check.id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "checks.id".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            if !seen.insert(check.id.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    field: format!("checks.{}", check.id),
                    message: "duplicate check id".to_string(),
                });
            }
            if check.command.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("checks.{}.command", check.id),
                    message: "must not be empty".to_string(),
                });
            }
            if check.timeout_ms == Some(0) {
                return Err(ConfigError::ValidationFailed {
                    field: format!("checks.{}.timeout_ms", check.id),
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }
}
