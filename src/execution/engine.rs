//! Main execution engine - drives a run through its steps

use crate::{
    core::{
        should_run, ConfigError, Event, Pipeline, PipelineError, RunContext, RunResult, RunState,
        RunStatus, SecretStore, StepOutcome,
    },
    execution::{CommandRunner, StepExecutor},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        number: usize,
        name: String,
    },
    StepFinished {
        number: usize,
        outcome: StepOutcome,
    },
    RunFinished {
        execution_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Requests cancellation of the run in progress
///
/// The step already running is left to finish; no further step starts.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Main pipeline execution engine
pub struct ExecutionEngine<R> {
    executor: StepExecutor<R>,
    event_handlers: Vec<EventHandler>,
    cancel: CancelHandle,
}

impl<R: CommandRunner> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            executor: StepExecutor::new(runner),
            event_handlers: Vec::new(),
            cancel: CancelHandle::default(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Handle for cancelling runs started by this engine
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the pipeline's steps in order, stopping at the first failure
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        context: &RunContext,
    ) -> Result<RunResult, PipelineError> {
        if pipeline.is_empty() {
            return Err(ConfigError::EmptyPipeline.into());
        }
        if let Some((index, step)) = pipeline
            .steps()
            .iter()
            .enumerate()
            .find(|(_, step)| step.run.trim().is_empty())
        {
            return Err(ConfigError::MissingCommand {
                index: index + 1,
                name: step.name.clone(),
            }
            .into());
        }

        let execution_id = context.execution_id;
        let total_steps = pipeline.len();

        info!(
            "Starting pipeline execution: {} ({}, {} steps)",
            pipeline.name, execution_id, total_steps
        );
        self.emit_event(ExecutionEvent::RunStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            total_steps,
        });

        let mut state = RunState::start();
        let mut outcomes = Vec::with_capacity(total_steps);

        while let RunState::Pending(number) = state {
            if self.cancel.is_cancelled() {
                warn!("Run {} cancelled before step {}", execution_id, number);
                state = state.cancel();
                break;
            }

            let Some(step) = pipeline.step(number) else {
                break;
            };

            self.emit_event(ExecutionEvent::StepStarted {
                number,
                name: step.name.clone(),
            });

            let outcome = self.executor.execute(step, context).await;
            let succeeded = outcome.success();

            self.emit_event(ExecutionEvent::StepFinished {
                number,
                outcome: outcome.clone(),
            });
            outcomes.push(outcome);

            state = state.advance(succeeded, total_steps);
        }

        // The loop only exits on a terminal state
        let result = RunResult::from_state(state, outcomes).ok_or(ConfigError::EmptyPipeline)?;

        info!(
            "Pipeline execution finished: {} - {:?}",
            pipeline.name, result.status
        );
        self.emit_event(ExecutionEvent::RunFinished {
            execution_id,
            status: result.status,
        });

        Ok(result)
    }

    /// Evaluate the trigger, prepare the context and run
    ///
    /// Returns `Ok(None)` when the event doesn't match the pipeline's rule.
    pub async fn run_for_event(
        &self,
        pipeline: &Pipeline,
        event: Event,
        secrets: &dyn SecretStore,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Option<(RunContext, RunResult)>, PipelineError> {
        if !should_run(&event, &pipeline.trigger) {
            info!(
                "Event '{}' does not trigger pipeline {}",
                event.name, pipeline.name
            );
            return Ok(None);
        }

        let context = RunContext::prepare(pipeline, event, secrets, working_dir)?;
        let result = self.run(pipeline, &context).await?;
        Ok(Some((context, result)))
    }
}
