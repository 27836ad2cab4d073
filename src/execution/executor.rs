//! Job executor - runs one job instance's steps in order

use crate::{
    core::{JobDefinition, JobInstance, JobResult, Step, StepResult, StepStatus},
    execution::events::{EventEmitter, ExecutionEvent},
    runner::StepRunner,
};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Where a job is in its step sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Steps are handed to the runner
    Running,
    /// A step failed under fail-fast; the rest are skipped
    Aborted,
    /// Cancellation was observed; the rest are cancelled
    Cancelled,
}

/// Executes the steps of a single job instance
pub struct JobExecutor<R> {
    runner: Arc<R>,
    events: EventEmitter,
}

impl<R: StepRunner> JobExecutor<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            events: EventEmitter::new(),
        }
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }

    /// Run every step of `job` for `instance`, in declaration order.
    ///
    /// Steps never overlap. Cancellation is checked before each step, so a
    /// step that already started always finishes.
    pub async fn execute(
        &self,
        instance: &JobInstance,
        job: &JobDefinition,
        cancel: &CancellationToken,
    ) -> JobResult {
        info!("Starting job {}", instance);
        self.events.emit(ExecutionEvent::JobStarted {
            job: instance.clone(),
        });

        let mut flow = Flow::Running;
        let mut steps = Vec::with_capacity(job.steps.len());

        for step in &job.steps {
            if flow == Flow::Running && cancel.is_cancelled() {
                info!("Job {} cancelled before step {}", instance, step.name);
                flow = Flow::Cancelled;
            }

            let result = match flow {
                Flow::Running => self.run_step(instance, step).await,
                Flow::Aborted => StepResult::not_run(&step.name, &step.action, StepStatus::Skipped),
                Flow::Cancelled => {
                    StepResult::not_run(&step.name, &step.action, StepStatus::Cancelled)
                }
            };

            if flow == Flow::Running && result.status == StepStatus::Failure && job.fail_fast {
                debug!("Job {} aborting after failed step {}", instance, step.name);
                flow = Flow::Aborted;
            }

            self.events.emit(ExecutionEvent::StepFinished {
                job: instance.clone(),
                result: result.clone(),
            });
            steps.push(result);
        }

        let result = JobResult::from_steps(instance.clone(), steps);
        info!("Job {} finished: {:?}", instance, result.status);
        self.events.emit(ExecutionEvent::JobCompleted {
            result: result.clone(),
        });

        result
    }

    /// Run one step through the runner
    async fn run_step(&self, instance: &JobInstance, step: &Step) -> StepResult {
        let params = step.render_params(instance);
        debug!("Step {} of job {}: {} {:?}", step.name, instance, step.action, params);

        self.events.emit(ExecutionEvent::StepStarted {
            job: instance.clone(),
            step: step.name.clone(),
        });

        let started_at = Utc::now();
        let outcome = AssertUnwindSafe(self.runner.run(&step.action, &params))
            .catch_unwind()
            .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Runner panicked on step {} in job {}: {}", step.name, instance, message);
                return StepResult::failure(
                    &step.name,
                    &step.action,
                    String::new(),
                    Some(format!("Runner panicked: {}", message)),
                    started_at,
                );
            }
        };

        match outcome {
            Ok(output) if output.success => {
                StepResult::success(&step.name, &step.action, output.output, started_at)
            }
            Ok(output) => {
                warn!("Step {} failed in job {}", step.name, instance);
                StepResult::failure(&step.name, &step.action, output.output, None, started_at)
            }
            Err(e) => {
                error!("Runner error for step {} in job {}: {}", step.name, instance, e);
                StepResult::failure(
                    &step.name,
                    &step.action,
                    String::new(),
                    Some(e.to_string()),
                    started_at,
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
