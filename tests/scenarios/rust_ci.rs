//! Test: Rust CI - a 2x2 matrix where one cell fails its format check

use crate::helpers::*;
use matrix_pipeline::core::{JobStatus, PipelineStatus, StepStatus};
use matrix_pipeline::execution::ExecutionEvent;
use matrix_pipeline::{CancellationToken, PipelineOrchestrator};
use std::sync::{Arc, Mutex};

/// fmt fails only for (B, nightly); the other three jobs pass
#[tokio::test]
async fn test_single_cell_failure() {
    let pipeline = pipeline_from_yaml(RUST_CI);
    let runner = Arc::new(
        MockRunner::new().fail_on("cargo-fmt", &[("os", "B"), ("toolchain", "nightly")]),
    );

    let result = run_with_mock(&pipeline, runner.clone(), CancellationToken::new()).await;

    assert_eq!(result.status, PipelineStatus::Failure);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.jobs.len(), 4);
    assert_eq!(result.count(JobStatus::Success), 3);
    assert_eq!(result.count(JobStatus::Failure), 1);

    assert_job_status(&result, &["A", "stable"], JobStatus::Success);
    assert_job_status(&result, &["A", "nightly"], JobStatus::Success);
    assert_job_status(&result, &["B", "stable"], JobStatus::Success);
    assert_job_steps(
        &result,
        &["B", "nightly"],
        &[
            StepStatus::Success,
            StepStatus::Success,
            StepStatus::Success,
            StepStatus::Failure,
            StepStatus::Skipped,
        ],
    );

    // clippy never ran for the failing cell
    assert_eq!(
        runner.calls_for(&[("os", "B"), ("toolchain", "nightly")]),
        vec!["checkout", "toolchain", "cargo-check", "cargo-fmt"]
    );
    assert_eq!(runner.call_count(), 3 * 5 + 4);
}

/// Results come back in expansion order whatever order jobs finish in
#[tokio::test]
async fn test_results_in_expansion_order() {
    let pipeline = pipeline_from_yaml(RUST_CI).with_max_parallel(None);
    let runner = Arc::new(MockRunner::new());

    let result = run_with_mock(&pipeline, runner, CancellationToken::new()).await;

    let keys: Vec<String> = result.jobs.iter().map(|j| j.instance.to_string()).collect();
    assert_eq!(
        keys,
        vec!["(A, stable)", "(A, nightly)", "(B, stable)", "(B, nightly)"]
    );
    assert!(result.is_success());
    assert_all_terminal(&result);
}

/// Matrix values reach the runner through step parameters
#[tokio::test]
async fn test_parameters_rendered_per_job() {
    let pipeline = pipeline_from_yaml(RUST_CI);
    let runner = Arc::new(MockRunner::new());

    run_with_mock(&pipeline, runner.clone(), CancellationToken::new()).await;

    let installs: Vec<_> = runner
        .calls()
        .into_iter()
        .filter(|c| c.action == "toolchain")
        .collect();
    assert_eq!(installs.len(), 4);
    for call in &installs {
        assert!(!call.params["toolchain"].contains("${{"));
        assert_eq!(call.params["components"], "clippy, rustfmt");
    }
}

/// Every job reports start and completion exactly once
#[tokio::test]
async fn test_events_cover_every_job() {
    let pipeline = pipeline_from_yaml(RUST_CI);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut orchestrator = PipelineOrchestrator::new(MockRunner::new());
    {
        let seen = seen.clone();
        orchestrator.add_event_handler(move |event| {
            let label = match event {
                ExecutionEvent::PipelineStarted { total_jobs, .. } => {
                    format!("pipeline:{}", total_jobs)
                }
                ExecutionEvent::JobStarted { .. } => "job".to_string(),
                ExecutionEvent::JobCompleted { .. } => "done".to_string(),
                ExecutionEvent::PipelineCompleted { status, .. } => format!("{:?}", status),
                _ => return,
            };
            seen.lock().unwrap().push(label);
        });
    }

    orchestrator.run(&pipeline).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first().map(String::as_str), Some("pipeline:4"));
    assert_eq!(seen.last().map(String::as_str), Some("Success"));
    assert_eq!(seen.iter().filter(|l| *l == "job").count(), 4);
    assert_eq!(seen.iter().filter(|l| *l == "done").count(), 4);
}
