//! Test: Failure Handling - the first failing step ends the run

use crate::helpers::*;
use stepline::core::{RunStatus, StepExit};

/// A failing format check stops everything after it
#[tokio::test]
async fn test_format_check_failure_stops_run() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new().failing("Check formatting", 1);

    let result = run_pipeline_with_mock(&pipeline, runner).await;

    assert_run_failed_at(&result, 1);
    assert_execution_order(&result, &["Check formatting"]);
    assert_eq!(result.result.status.exit_code(), 1);
}

/// Failure in the middle keeps the outcomes of the steps before it
#[tokio::test]
async fn test_failure_in_middle() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new().failing("Build", 101);

    let result = run_pipeline_with_mock(&pipeline, runner).await;

    assert_run_failed_at(&result, 3);
    assert_execution_order(&result, &["Check formatting", "Clippy", "Build"]);

    let failed = result.result.failed_outcome().unwrap();
    assert_eq!(failed.step_name, "Build");
    assert_eq!(failed.exit, StepExit::Code(101));
}

/// Failure on the last step is still a failure
#[tokio::test]
async fn test_failure_on_last_step() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new().failing("Run tests", 1);

    let result = run_pipeline_with_mock(&pipeline, runner).await;

    assert_run_failed_at(&result, 4);
}

/// Commands killed without an exit code or never started count as failures
#[tokio::test]
async fn test_terminated_and_spawn_errors_fail_the_step() {
    let pipeline = bundled_pipeline();

    let terminated = MockRunner::new().with_exit("Clippy", StepExit::Terminated);
    let result = run_pipeline_with_mock(&pipeline, terminated).await;
    assert_run_failed_at(&result, 2);

    let unspawnable = MockRunner::new().with_exit(
        "Check formatting",
        StepExit::SpawnError("No such file or directory".to_string()),
    );
    let result = run_pipeline_with_mock(&pipeline, unspawnable).await;
    assert_run_failed_at(&result, 1);
}

/// Re-running with the same inputs reproduces the same failure
#[tokio::test]
async fn test_rerun_reproduces_failure() {
    let pipeline = bundled_pipeline();

    let first = run_pipeline_with_mock(&pipeline, MockRunner::new().failing("Clippy", 1)).await;
    let second = run_pipeline_with_mock(&pipeline, MockRunner::new().failing("Clippy", 1)).await;

    assert_eq!(first.result.status, RunStatus::Failed { step: 2 });
    assert_eq!(first.result.status, second.result.status);
    assert_eq!(first.invoked_steps(), second.invoked_steps());
    assert_ne!(first.context.execution_id, second.context.execution_id);
}
