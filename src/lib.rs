//! stepline - A sequential CI pipeline runner
//!
//! A pipeline is an ordered list of shell steps plus a trigger rule and a set
//! of environment declarations. Runs stop at the first failing step.

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use crate::core::{
    should_run, Event, EventKind, Pipeline, PipelineError, RunContext, RunResult, RunStatus, Step,
    StepOutcome, TriggerRule,
};
pub use crate::execution::{CancelHandle, CommandRunner, ExecutionEngine, ExecutionEvent, ShellCommandRunner};
