//! Test: Environment - one resolved environment per run, copied into each step

use crate::helpers::*;
use stepline::core::config::PipelineConfig;
use stepline::core::env::StaticSecretStore;
use stepline::core::error::{ConfigError, EnvironmentError};
use stepline::core::{Event, PipelineError, RunStatus};
use stepline::execution::ExecutionEngine;

/// Every step sees the same values, whatever the previous step did to its copy
#[tokio::test]
async fn test_step_mutations_do_not_leak() {
    let pipeline = bundled_pipeline();

    let result = run_pipeline_with_mock(&pipeline, MockRunner::new()).await;

    assert_run_succeeded(&result, 4);
    for invocation in &result.invocations {
        assert_eq!(invocation.env.get("CARGO_TERM_COLOR"), Some("always"));
        assert_eq!(invocation.env.get("LEAKED_FROM"), None);
        assert_eq!(invocation.env, result.context.environment);
    }
}

/// The secret reaches steps but stays masked in debug output
#[tokio::test]
async fn test_secret_is_resolved_and_masked() {
    let pipeline = bundled_pipeline();

    let result = run_pipeline_with_mock(&pipeline, MockRunner::new()).await;

    let env = result.env_of("Build");
    assert_eq!(env.get("ZEROX_API_KEY"), Some("zx-test-key"));
    assert!(env.is_secret("ZEROX_API_KEY"));
    assert!(!format!("{:?}", env).contains("zx-test-key"));
    assert!(!format!("{:?}", result.context).contains("zx-test-key"));
}

/// A missing secret fails before any step runs
#[tokio::test]
async fn test_missing_secret_is_fatal() {
    let pipeline = bundled_pipeline();
    let runner = MockRunner::new();
    let engine = ExecutionEngine::new(runner.clone());

    let err = engine
        .run_for_event(&pipeline, Event::push(), &StaticSecretStore::new(), ".")
        .await
        .unwrap_err();

    match err {
        PipelineError::Environment(EnvironmentError::MissingSecret { variable, secret }) => {
            assert_eq!(variable, "ZEROX_API_KEY");
            assert_eq!(secret, "ZEROX_API_KEY");
        }
        other => panic!("expected missing secret, got {:?}", other),
    }
    assert!(runner.invocations().is_empty());
}

/// Both secret reference forms resolve
#[tokio::test]
async fn test_secret_reference_forms() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Test: Secrets"
env:
  INLINE: ${{ secrets.ZEROX_API_KEY }}
  MAPPED: { secret: ZEROX_API_KEY }
  PLAIN: value
steps:
  - name: show
    run: env
"#,
    );

    let result = run_pipeline_with_mock(&pipeline, MockRunner::new()).await;

    let env = result.env_of("show");
    assert_eq!(env.get("INLINE"), Some("zx-test-key"));
    assert_eq!(env.get("MAPPED"), Some("zx-test-key"));
    assert_eq!(env.get("PLAIN"), Some("value"));
    assert!(!env.is_secret("PLAIN"));
}

/// Runs started side by side share nothing
#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let pipeline = bundled_pipeline();

    let (passing, failing) = tokio::join!(
        run_pipeline_with_mock(&pipeline, MockRunner::new()),
        run_pipeline_with_mock(&pipeline, MockRunner::new().failing("Clippy", 2)),
    );

    assert_eq!(passing.result.status, RunStatus::Success);
    assert_eq!(failing.result.status, RunStatus::Failed { step: 2 });
    assert_eq!(passing.invocations.len(), 4);
    assert_eq!(failing.invocations.len(), 2);
}

/// Structural problems are reported before anything runs
#[test]
fn test_invalid_definitions_are_rejected() {
    let empty = PipelineConfig::from_yaml("name: empty\nsteps: []\n").unwrap_err();
    assert!(matches!(empty, ConfigError::EmptyPipeline));

    let missing = PipelineConfig::from_yaml(
        r#"
name: missing
steps:
  - name: fmt
    run: cargo fmt
  - name: checkout
"#,
    )
    .unwrap_err();
    match missing {
        ConfigError::MissingCommand { index, name } => {
            assert_eq!(index, 2);
            assert_eq!(name, "checkout");
        }
        other => panic!("expected missing command, got {:?}", other),
    }

    let unknown = PipelineConfig::from_yaml(
        r#"
name: unknown
on: [push, release]
steps:
  - name: fmt
    run: cargo fmt
"#,
    )
    .unwrap_err();
    assert!(matches!(unknown, ConfigError::UnknownEventKind(kind) if kind == "release"));
}
