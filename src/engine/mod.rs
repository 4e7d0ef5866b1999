//! Terminal front end for the deployment engine
//!
//! The engine itself lives in the `declarative` crate. This module adds:
//! 1. Display - Show planned steps and property diffs
//! 2. Confirmation - Prompt before applying, unless `--yes`
//! 3. Reporting - Progress while applying, then a summary

pub mod differ;
pub mod executor;

pub use executor::{RunOptions, confirm_proceed, run};
