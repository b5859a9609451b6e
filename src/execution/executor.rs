//! Step executor - runs individual steps through a command runner

use crate::{
    core::{RunContext, Step, StepExit, StepOutcome},
    execution::{CommandError, CommandRunner},
};
use chrono::Utc;
use std::time::Instant;
use tracing::{error, info};

/// Executes a single step
pub struct StepExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute a step and record its outcome
    ///
    /// A command that can't be launched is reported as a failing outcome,
    /// not an error.
    pub async fn execute(&self, step: &Step, context: &RunContext) -> StepOutcome {
        info!("Executing step: {}", step.name);

        let started_at = Utc::now();
        let clock = Instant::now();

        let exit = match self
            .runner
            .run(step, context.snapshot(), context.working_dir())
            .await
        {
            Ok(exit) => exit,
            Err(e) => {
                error!("Could not run step {}: {}", step.name, e);
                match &e {
                    CommandError::Spawn { .. } => StepExit::SpawnError(e.to_string()),
                    CommandError::Wait(source) => StepExit::WaitError(source.to_string()),
                }
            }
        };

        let duration = clock.elapsed();
        info!("Step {} finished: {} in {:?}", step.name, exit, duration);

        StepOutcome {
            step_name: step.name.clone(),
            exit,
            started_at,
            duration,
        }
    }
}
