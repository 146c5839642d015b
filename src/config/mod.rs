//! Configuration system for ci-gate.
//! TOML-based, layered resolution: CLI > env > config file > defaults.

pub mod error;
pub mod gate_config;

pub use error::ConfigError;
pub use gate_config::{CheckDefinition, CliOverrides, GateConfig, CONFIG_FILE_NAME};
