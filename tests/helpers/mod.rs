//! Test utility functions for matrix-pipeline

#![allow(dead_code)]

use async_trait::async_trait;
use matrix_pipeline::core::config::PipelineConfig;
use matrix_pipeline::core::{JobResult, JobStatus, Pipeline, PipelineResult, StepStatus};
use matrix_pipeline::runner::{RunOutput, RunnerError, StepRunner};
use matrix_pipeline::{CancellationToken, PipelineOrchestrator};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RUST_CI: &str = include_str!("../../pipelines/rust-ci.yml");

/// Matches a runner call by action and a subset of its rendered parameters
#[derive(Debug, Clone)]
pub struct CallMatcher {
    action: String,
    params: Vec<(String, String)>,
}

impl CallMatcher {
    pub fn new(action: &str, params: &[(&str, &str)]) -> Self {
        Self {
            action: action.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn matches(&self, action: &str, params: &BTreeMap<String, String>) -> bool {
        self.action == action
            && self
                .params
                .iter()
                .all(|(k, v)| params.get(k).map(String::as_str) == Some(v.as_str()))
    }
}

/// One recorded runner invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub action: String,
    pub params: BTreeMap<String, String>,
}

/// Mock runner that records calls and fails the ones it is told to
#[derive(Default)]
pub struct MockRunner {
    failures: Vec<CallMatcher>,
    errors: Vec<CallMatcher>,
    cancel_on: Option<(CallMatcher, CancellationToken)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report failure for matching calls
    pub fn fail_on(mut self, action: &str, params: &[(&str, &str)]) -> Self {
        self.failures.push(CallMatcher::new(action, params));
        self
    }

    /// Return a runner error for matching calls
    pub fn error_on(mut self, action: &str, params: &[(&str, &str)]) -> Self {
        self.errors.push(CallMatcher::new(action, params));
        self
    }

    /// Cancel `token` while the matching call is running
    pub fn cancel_on(
        mut self,
        action: &str,
        params: &[(&str, &str)],
        token: CancellationToken,
    ) -> Self {
        self.cancel_on = Some((CallMatcher::new(action, params), token));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls whose rendered parameters match all of `params`
    pub fn calls_for(&self, params: &[(&str, &str)]) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                params
                    .iter()
                    .all(|(k, v)| c.params.get(*k).map(String::as_str) == Some(*v))
            })
            .map(|c| c.action)
            .collect()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepRunner for MockRunner {
    async fn run(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RunOutput, RunnerError> {
        self.calls.lock().unwrap().push(Call {
            action: action.to_string(),
            params: params.clone(),
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some((matcher, token)) = &self.cancel_on {
            if matcher.matches(action, params) {
                token.cancel();
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.errors.iter().any(|m| m.matches(action, params)) {
            return Err(RunnerError::ActionNotFound(action.to_string()));
        }
        if self.failures.iter().any(|m| m.matches(action, params)) {
            return Ok(RunOutput::failure(format!("{} failed", action)));
        }
        Ok(RunOutput::success(format!("{} ok", action)))
    }
}

/// Parse a pipeline from YAML
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml)
        .expect("valid pipeline config")
        .to_pipeline()
        .expect("valid pipeline")
}

/// Run a pipeline with a shared mock runner
pub async fn run_with_mock(
    pipeline: &Pipeline,
    runner: Arc<MockRunner>,
    cancel: CancellationToken,
) -> PipelineResult {
    PipelineOrchestrator::with_shared_runner(runner)
        .run_with_cancellation(pipeline, cancel)
        .await
        .expect("pipeline should start")
}

pub fn step_statuses(job: &JobResult) -> Vec<StepStatus> {
    job.steps.iter().map(|s| s.status).collect()
}

/// Assert the status of the job with the given matrix values
pub fn assert_job_status(result: &PipelineResult, key: &[&str], expected: JobStatus) {
    let job = result
        .job(key)
        .unwrap_or_else(|| panic!("job {:?} not found", key));
    assert_eq!(
        job.status, expected,
        "job {:?} expected {:?}, got {:?}",
        key, expected, job.status
    );
}

/// Assert the step statuses of the job with the given matrix values
pub fn assert_job_steps(result: &PipelineResult, key: &[&str], expected: &[StepStatus]) {
    let job = result
        .job(key)
        .unwrap_or_else(|| panic!("job {:?} not found", key));
    assert_eq!(step_statuses(job), expected, "steps of job {:?}", key);
}

/// Assert every job reached a terminal state
pub fn assert_all_terminal(result: &PipelineResult) {
    for job in &result.jobs {
        assert!(
            job.status.is_terminal(),
            "job {} ended as {:?}",
            job.instance,
            job.status
        );
    }
}
