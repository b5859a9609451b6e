//! Test: Triggers - which events start a run

use crate::helpers::*;
use stepline::core::{should_run, Event, EventKind, TriggerRule};

#[test]
fn test_pull_request_against_rules() {
    let event = Event::pull_request().with_branch("main");

    let both = TriggerRule::new([EventKind::Push, EventKind::PullRequest]);
    let push_only = TriggerRule::new([EventKind::Push]);

    assert!(should_run(&event, &both));
    assert!(!should_run(&event, &push_only));
}

#[test]
fn test_unknown_event_never_matches() {
    let event = Event::new("workflow_dispatch");
    assert!(event.kind().is_none());
    assert!(!should_run(&event, &TriggerRule::any()));
}

/// Skipped events never reach the runner
#[tokio::test]
async fn test_untriggered_event_runs_nothing() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Test: Push only"
on: push
steps:
  - name: build
    run: cargo build
"#,
    );
    let runner = MockRunner::new();

    let result = run_pipeline_for_event(&pipeline, Event::pull_request(), runner.clone()).await;

    assert!(result.is_none());
    assert!(runner.invocations().is_empty());
}

/// The bundled pipeline runs for both pushes and pull requests
#[tokio::test]
async fn test_bundled_pipeline_triggers() {
    let pipeline = bundled_pipeline();

    for event in [Event::push(), Event::pull_request()] {
        let result = run_pipeline_for_event(&pipeline, event, MockRunner::new()).await;
        assert!(result.is_some());
    }

    let result = run_pipeline_for_event(&pipeline, Event::new("release"), MockRunner::new()).await;
    assert!(result.is_none());
}

/// Mapping keys name the accepted kinds, as in workflow files
#[tokio::test]
async fn test_mapping_form_of_on() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Test: Mapping"
on:
  pull_request:
    branches: [main]
steps:
  - name: build
    run: cargo build
"#,
    );

    assert!(run_pipeline_for_event(&pipeline, Event::pull_request(), MockRunner::new())
        .await
        .is_some());
    assert!(run_pipeline_for_event(&pipeline, Event::push(), MockRunner::new())
        .await
        .is_none());
}
