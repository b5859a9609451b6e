//! Pipeline execution engine

pub mod command;
pub mod engine;
pub mod executor;

pub use command::{CommandError, CommandRunner, ShellCommandRunner};
pub use engine::{CancelHandle, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::StepExecutor;
