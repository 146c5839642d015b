//! Gate engine module.
//!
//! Provides check orchestration and the pass/fail decision.

pub mod orchestrator;
pub mod result;
