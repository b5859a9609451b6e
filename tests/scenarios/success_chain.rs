//! Test: Success Chain - every step runs, in order

use crate::helpers::*;
use stepline::core::RunStatus;

/// All four steps of the bundled pipeline pass
#[tokio::test]
async fn test_bundled_pipeline_succeeds() {
    let pipeline = bundled_pipeline();

    let result = run_pipeline_with_mock(&pipeline, MockRunner::new()).await;

    assert_run_succeeded(&result, 4);
    assert_execution_order(
        &result,
        &["Check formatting", "Clippy", "Build", "Run tests"],
    );

    let commands: Vec<_> = result.invocations.iter().map(|i| i.run.as_str()).collect();
    assert_eq!(
        commands,
        vec![
            "cargo fmt -- --check",
            "cargo clippy",
            "cargo build --verbose",
            "cargo test --verbose"
        ]
    );
}

/// Outcomes are recorded in step order with names matching the steps
#[tokio::test]
async fn test_outcomes_follow_step_order() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Test: Ordering"
steps:
  - name: one
    run: echo 1
  - name: two
    run: echo 2
  - name: three
    run: echo 3
"#,
    );

    let result = run_pipeline_with_mock(&pipeline, MockRunner::new()).await;

    assert_eq!(result.result.status, RunStatus::Success);
    let names: Vec<_> = result
        .result
        .outcomes
        .iter()
        .map(|o| o.step_name.as_str())
        .collect();
    assert_eq!(names, vec!["one", "two", "three"]);

    // Each step starts after the previous one finished
    for pair in result.result.outcomes.windows(2) {
        assert!(pair[0].started_at <= pair[1].started_at);
    }
}

/// A single-step pipeline is a valid pipeline
#[tokio::test]
async fn test_single_step_pipeline() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Test: Single"
steps:
  - name: only
    run: "true"
"#,
    );

    let result = run_pipeline_with_mock(&pipeline, MockRunner::new()).await;

    assert_run_succeeded(&result, 1);
    assert_eq!(result.result.status.exit_code(), 0);
}
