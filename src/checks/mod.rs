//! Gate check definitions.
//!
//! The default gate runs the two verification scripts of the pipeline:
//! - workspace: `./scripts/check-workspace.sh`
//! - examples: `./scripts/check-examples.sh`
//!
//! Both are opaque to the gate. Only their termination status matters.

pub mod external;

use crate::config::{CheckDefinition, GateConfig};
use crate::engine::orchestrator::RegisteredCheck;
use external::ExternalCheck;
use std::path::Path;

/// The checks run when no configuration file provides its own.
pub fn default_definitions() -> Vec<CheckDefinition> {
    let mut workspace = CheckDefinition::new("workspace", "./scripts/check-workspace.sh");
    workspace.name = Some("Workspace Check".to_string());
    workspace.description = "Build, lint and test the workspace crates".to_string();

    let mut examples = CheckDefinition::new("examples", "./scripts/check-examples.sh");
    examples.name = Some("Examples Check".to_string());
    examples.description = "Build and test the example projects".to_string();

    vec![workspace, examples]
}

/// Build runnable checks for every configured definition, in order.
pub fn create_checks(config: &GateConfig, root: &Path) -> Vec<RegisteredCheck> {
    config
        .checks
        .iter()
        .map(|def| ExternalCheck::from_definition(def, config, root).into_registered())
        .collect()
}

/// Resolve every configured definition without wrapping it.
pub fn resolve_checks(config: &GateConfig, root: &Path) -> Vec<ExternalCheck> {
    config
        .checks
        .iter()
        .map(|def| ExternalCheck::from_definition(def, config, root))
        .collect()
}
