//! CLI module for argument parsing and output formatting.
//!
//! This module provides zero-dependency command line argument parsing
//! and output format selection.

pub mod args;
pub mod output;
