//! Test utilities for stepline

#![allow(dead_code)]

use async_trait::async_trait;
use stepline::core::config::PipelineConfig;
use stepline::core::env::StaticSecretStore;
use stepline::core::{EnvironmentSet, Event, Pipeline, RunContext, RunResult, RunStatus, Step, StepExit};
use stepline::execution::{CancelHandle, CommandError, CommandRunner, ExecutionEngine};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One call the mock runner received
#[derive(Debug, Clone)]
pub struct Invocation {
    pub step_name: String,
    pub run: String,
    pub env: EnvironmentSet,
    pub working_dir: PathBuf,
}

/// Mock runner with scripted exit codes per step name
///
/// Steps without a script exit 0. Every invocation also writes into its own
/// environment copy, so tests can check that later steps never see it.
#[derive(Clone, Default)]
pub struct MockRunner {
    exits: Arc<HashMap<String, StepExit>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    cancel_after: Arc<Mutex<Option<(String, CancelHandle)>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named step end with `exit`
    pub fn with_exit(mut self, step_name: &str, exit: StepExit) -> Self {
        Arc::make_mut(&mut self.exits).insert(step_name.to_string(), exit);
        self
    }

    /// Make the named step exit with `code`
    pub fn failing(self, step_name: &str, code: i32) -> Self {
        self.with_exit(step_name, StepExit::Code(code))
    }

    /// Request cancellation while the named step is running
    pub fn cancel_during(&self, step_name: &str, handle: CancelHandle) {
        *self.cancel_after.lock().unwrap() = Some((step_name.to_string(), handle));
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Names of the steps that were started, in order
    pub fn invoked_steps(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .map(|i| i.step_name)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        step: &Step,
        mut env: EnvironmentSet,
        working_dir: &Path,
    ) -> Result<StepExit, CommandError> {
        self.invocations.lock().unwrap().push(Invocation {
            step_name: step.name.clone(),
            run: step.run.clone(),
            env: env.clone(),
            working_dir: working_dir.to_path_buf(),
        });

        // A real command can do whatever it likes with its environment
        env.insert("LEAKED_FROM".to_string(), step.name.clone());
        env.remove("CARGO_TERM_COLOR");

        if let Some((name, handle)) = self.cancel_after.lock().unwrap().as_ref() {
            if name == &step.name {
                handle.cancel();
            }
        }

        Ok(self
            .exits
            .get(&step.name)
            .cloned()
            .unwrap_or(StepExit::Code(0)))
    }
}

/// Test result from running a pipeline
#[derive(Debug, Clone)]
pub struct PipelineTestResult {
    pub result: RunResult,
    pub context: RunContext,
    pub invocations: Vec<Invocation>,
}

impl PipelineTestResult {
    pub fn invoked_steps(&self) -> Vec<String> {
        self.invocations.iter().map(|i| i.step_name.clone()).collect()
    }

    /// Environment a step was started with
    pub fn env_of(&self, step_name: &str) -> &EnvironmentSet {
        &self
            .invocations
            .iter()
            .find(|i| i.step_name == step_name)
            .unwrap_or_else(|| panic!("Step '{}' was never invoked", step_name))
            .env
    }
}

/// Secret store holding the secrets the bundled pipeline needs
pub fn test_secrets() -> StaticSecretStore {
    StaticSecretStore::new().with_secret("ZEROX_API_KEY", "zx-test-key")
}

/// Run a pipeline for a push event with the given runner
pub async fn run_pipeline_with_mock(
    pipeline: &Pipeline,
    runner: MockRunner,
) -> PipelineTestResult {
    run_pipeline_for_event(pipeline, Event::push(), runner)
        .await
        .unwrap_or_else(|| panic!("Pipeline '{}' was not triggered", pipeline.name))
}

/// Run a pipeline for an event; `None` if the event doesn't trigger it
pub async fn run_pipeline_for_event(
    pipeline: &Pipeline,
    event: Event,
    runner: MockRunner,
) -> Option<PipelineTestResult> {
    let engine = ExecutionEngine::new(runner.clone());
    let (context, result) = engine
        .run_for_event(pipeline, event, &test_secrets(), ".")
        .await
        .unwrap_or_else(|e| panic!("Pipeline '{}' errored: {}", pipeline.name, e))?;

    Some(PipelineTestResult {
        result,
        context,
        invocations: runner.invocations(),
    })
}

/// Parse a pipeline from YAML string
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml)
        .and_then(|config| config.to_pipeline())
        .unwrap_or_else(|e| panic!("Failed to parse pipeline YAML: {}", e))
}

/// The pipeline shipped in `pipelines/ci.yml`
pub fn bundled_pipeline() -> Pipeline {
    pipeline_from_yaml(include_str!("../../pipelines/ci.yml"))
}

/// Assert the run succeeded with every step attempted
pub fn assert_run_succeeded(result: &PipelineTestResult, total_steps: usize) {
    assert_eq!(
        result.result.status,
        RunStatus::Success,
        "Run should have succeeded: {:?}",
        result.result
    );
    assert_eq!(result.result.attempted(), total_steps);
    assert!(result.result.outcomes.iter().all(|o| o.success()));
}

/// Assert the run failed at step `step` (1-based) and nothing ran after it
pub fn assert_run_failed_at(result: &PipelineTestResult, step: usize) {
    assert_eq!(
        result.result.status,
        RunStatus::Failed { step },
        "Run should have failed at step {}: {:?}",
        step,
        result.result
    );
    assert_eq!(result.result.attempted(), step);
    assert_eq!(result.invocations.len(), step);
    assert!(result.result.outcomes[..step - 1].iter().all(|o| o.success()));
    assert!(!result.result.outcomes[step - 1].success());
}

/// Assert specific steps were started in order
pub fn assert_execution_order(result: &PipelineTestResult, expected_order: &[&str]) {
    let actual = result.invoked_steps();
    assert_eq!(
        actual, expected_order,
        "Expected execution order: {:?}\nActual: {:?}",
        expected_order, actual
    );
}
