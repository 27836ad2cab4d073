//! Test: Cancellation - pending jobs never start, running jobs stop between steps

use crate::helpers::*;
use matrix_pipeline::core::{JobStatus, PipelineStatus, StepStatus};
use matrix_pipeline::CancellationToken;
use std::sync::Arc;

/// Cancelling during the third job leaves two finished and two cancelled jobs
#[tokio::test]
async fn test_cancel_mid_run() {
    let pipeline = pipeline_from_yaml(RUST_CI).with_max_parallel(Some(1));
    let cancel = CancellationToken::new();
    let runner = Arc::new(MockRunner::new().cancel_on(
        "checkout",
        &[("os", "B"), ("toolchain", "stable")],
        cancel.clone(),
    ));

    let result = run_with_mock(&pipeline, runner.clone(), cancel).await;

    assert!(result.cancelled);
    assert_eq!(result.status, PipelineStatus::Cancelled);
    assert_eq!(result.exit_code(), 130);
    assert_eq!(result.jobs.len(), 4);
    assert_all_terminal(&result);

    assert_job_status(&result, &["A", "stable"], JobStatus::Success);
    assert_job_status(&result, &["A", "nightly"], JobStatus::Success);

    // The running step finishes, the rest of the job is cancelled
    assert_job_steps(
        &result,
        &["B", "stable"],
        &[
            StepStatus::Success,
            StepStatus::Cancelled,
            StepStatus::Cancelled,
            StepStatus::Cancelled,
            StepStatus::Cancelled,
        ],
    );
    assert_job_status(&result, &["B", "stable"], JobStatus::Cancelled);

    // Never dispatched
    assert_job_status(&result, &["B", "nightly"], JobStatus::Cancelled);
    assert!(runner
        .calls_for(&[("os", "B"), ("toolchain", "nightly")])
        .is_empty());
    assert_eq!(runner.call_count(), 2 * 5 + 1);
}

/// Cancelling before the run starts cancels every job without running anything
#[tokio::test]
async fn test_cancel_before_start() {
    let pipeline = pipeline_from_yaml(RUST_CI);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let runner = Arc::new(MockRunner::new());

    let result = run_with_mock(&pipeline, runner.clone(), cancel).await;

    assert_eq!(result.status, PipelineStatus::Cancelled);
    assert_eq!(result.count(JobStatus::Cancelled), 4);
    assert_eq!(runner.call_count(), 0);
    for job in &result.jobs {
        assert!(step_statuses(job).iter().all(|s| *s == StepStatus::Cancelled));
    }
}

/// A failure seen before cancellation stays a failure
#[tokio::test]
async fn test_failure_kept_after_cancel() {
    let pipeline = pipeline_from_yaml(RUST_CI).with_max_parallel(Some(1));
    let cancel = CancellationToken::new();
    let runner = Arc::new(
        MockRunner::new()
            .fail_on("cargo-fmt", &[("os", "A"), ("toolchain", "stable")])
            .cancel_on("checkout", &[("os", "A"), ("toolchain", "nightly")], cancel.clone()),
    );

    let result = run_with_mock(&pipeline, runner, cancel).await;

    assert_eq!(result.status, PipelineStatus::Cancelled);
    assert_job_status(&result, &["A", "stable"], JobStatus::Failure);
    assert_job_status(&result, &["A", "nightly"], JobStatus::Cancelled);
    assert_eq!(result.count(JobStatus::Cancelled), 3);
}
