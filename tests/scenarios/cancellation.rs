//! Test: Cancellation - no new step starts once cancelled

use crate::helpers::*;
use stepline::core::{Event, RunContext, RunStatus};
use stepline::execution::ExecutionEngine;

fn context_for(pipeline: &stepline::core::Pipeline) -> RunContext {
    RunContext::prepare(pipeline, Event::push(), &test_secrets(), ".").unwrap()
}

/// Cancelling during a step lets it finish and stops before the next
#[tokio::test]
async fn test_cancel_during_step() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new();
    let engine = ExecutionEngine::new(runner.clone());
    runner.cancel_during("Clippy", engine.cancel_handle());

    let result = engine.run(&pipeline, &context_for(&pipeline)).await.unwrap();

    assert_eq!(result.status, RunStatus::Cancelled { before_step: 3 });
    assert_eq!(result.status.exit_code(), 130);
    assert_eq!(result.attempted(), 2);
    assert!(result.outcomes.iter().all(|o| o.success()));
    assert_eq!(runner.invoked_steps(), vec!["Check formatting", "Clippy"]);
}

/// A cancelled step that fails is reported as the failure
#[tokio::test]
async fn test_failure_wins_over_cancel() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new().failing("Clippy", 1);
    let engine = ExecutionEngine::new(runner.clone());
    runner.cancel_during("Clippy", engine.cancel_handle());

    let result = engine.run(&pipeline, &context_for(&pipeline)).await.unwrap();

    assert_eq!(result.status, RunStatus::Failed { step: 2 });
}

/// Cancelling during the last step leaves nothing to stop
#[tokio::test]
async fn test_cancel_during_last_step() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new();
    let engine = ExecutionEngine::new(runner.clone());
    runner.cancel_during("Run tests", engine.cancel_handle());

    let result = engine.run(&pipeline, &context_for(&pipeline)).await.unwrap();

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.attempted(), 4);
}
