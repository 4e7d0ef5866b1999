//! Apply context and callback traits
//!
//! These traits allow the engine to report progress and ask for
//! confirmation without depending on a specific terminal UI.

use crate::error::Result;
use crate::types::{ApplyResult, StepOp};
use crate::urn::Urn;

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called before a batch of steps starts
    fn on_batch_start(&mut self, count: usize, preview: bool);

    /// Called when a step starts (sequential execution only)
    fn on_step_start(&mut self, urn: &Urn, op: StepOp);

    /// Called when a step completes
    fn on_step_complete(&mut self, urn: &Urn, op: StepOp, result: &ApplyResult);

    /// Called when the batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize, _preview: bool) {}
    fn on_step_start(&mut self, _urn: &Urn, _op: StepOp) {}
    fn on_step_complete(&mut self, _urn: &Urn, _op: StepOp, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Context passed to resource operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Whether results are only projected (nothing is changed)
    pub preview: bool,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    pub fn new(preview: bool, verbose: bool) -> Self {
        Self { preview, verbose }
    }
}
