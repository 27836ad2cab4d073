//! Execution state and result models

use crate::core::matrix::JobInstance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Outcome of a single step within a job instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Runner reported success
    Success,
    /// Runner reported failure, or could not run the action
    Failure,
    /// Not run because an earlier step failed
    Skipped,
    /// Not run because the pipeline was cancelled
    Cancelled,
}

/// Lifecycle of a job instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid job transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobStatus {
    /// Check if the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failure | JobStatus::Cancelled
        )
    }

    /// Move to `to` if the lifecycle allows it.
    ///
    /// `Pending -> Running -> {Success | Failure | Cancelled}`; a pending job
    /// may also be cancelled without ever running.
    pub fn transition(self, to: JobStatus) -> Result<JobStatus, InvalidTransition> {
        let allowed = match (self, to) {
            (JobStatus::Pending, JobStatus::Running) => true,
            (JobStatus::Pending, JobStatus::Cancelled) => true,
            (JobStatus::Running, next) => next.is_terminal(),
            _ => false,
        };

        if allowed {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

/// Overall pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    Success,
    Failure,
    Cancelled,
}

/// Result of running one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub action: String,
    pub status: StepStatus,

    /// Captured output of the action
    pub output: String,

    /// Diagnostic when the runner itself could not run the action
    pub runner_error: Option<String>,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StepResult {
    pub fn success(name: &str, action: &str, output: String, started_at: DateTime<Utc>) -> Self {
        Self::executed(name, action, StepStatus::Success, output, None, started_at)
    }

    pub fn failure(
        name: &str,
        action: &str,
        output: String,
        runner_error: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self::executed(name, action, StepStatus::Failure, output, runner_error, started_at)
    }

    fn executed(
        name: &str,
        action: &str,
        status: StepStatus,
        output: String,
        runner_error: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.to_string(),
            action: action.to_string(),
            status,
            output,
            runner_error,
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
        }
    }

    /// A step that was never handed to the runner
    pub fn not_run(name: &str, action: &str, status: StepStatus) -> Self {
        Self {
            name: name.to_string(),
            action: action.to_string(),
            status,
            output: String::new(),
            runner_error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Aggregate of step results for one job instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub instance: JobInstance,
    pub status: JobStatus,
    pub steps: Vec<StepResult>,

    /// Diagnostic for a job that ended without running its steps to a result
    #[serde(default)]
    pub error: Option<String>,
}

impl JobResult {
    /// Seal the step results of a job.
    ///
    /// Cancelled if the job was interrupted, otherwise Failure if any step
    /// failed, otherwise Success.
    pub fn from_steps(instance: JobInstance, steps: Vec<StepResult>) -> Self {
        let status = if steps.iter().any(|s| s.status == StepStatus::Cancelled) {
            JobStatus::Cancelled
        } else if steps.iter().any(|s| s.status == StepStatus::Failure) {
            JobStatus::Failure
        } else {
            JobStatus::Success
        };

        Self {
            instance,
            status,
            steps,
            error: None,
        }
    }

    /// A job whose execution broke off without producing step results
    pub fn aborted(instance: JobInstance, error: String) -> Self {
        Self {
            instance,
            status: JobStatus::Failure,
            steps: Vec::new(),
            error: Some(error),
        }
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// Aggregate of all job results of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub pipeline_name: String,
    pub status: PipelineStatus,

    /// Job results in expansion order
    pub jobs: Vec<JobResult>,

    /// Whether cancellation was requested during the run
    pub cancelled: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn new(
        run_id: Uuid,
        pipeline_name: String,
        jobs: Vec<JobResult>,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        let status = Self::aggregate(&jobs, cancelled);
        Self {
            run_id,
            pipeline_name,
            status,
            jobs,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Cancelled when a requested cancellation interrupted at least one job,
    /// otherwise Failure if any job failed, otherwise Success
    pub fn aggregate(jobs: &[JobResult], cancelled: bool) -> PipelineStatus {
        if cancelled && jobs.iter().any(|j| j.status == JobStatus::Cancelled) {
            PipelineStatus::Cancelled
        } else if jobs.iter().all(JobResult::is_success) {
            PipelineStatus::Success
        } else {
            PipelineStatus::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }

    /// Process exit code for the run
    pub fn exit_code(&self) -> i32 {
        match self.status {
            PipelineStatus::Success => 0,
            PipelineStatus::Failure => 1,
            PipelineStatus::Cancelled => 130,
        }
    }

    /// Find a job by its assigned values, e.g. `["B", "nightly"]`
    pub fn job(&self, key: &[&str]) -> Option<&JobResult> {
        self.jobs.iter().find(|j| j.instance.key() == key)
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|j| j.status == status).count()
    }
}
