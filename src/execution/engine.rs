//! Pipeline orchestrator - fans jobs out over the matrix and aggregates results

use crate::{
    core::{
        ConfigError, JobDefinition, JobInstance, JobResult, JobStatus, Pipeline, PipelineResult,
        StepResult, StepStatus,
    },
    execution::{
        events::{EventEmitter, ExecutionEvent},
        executor::JobExecutor,
    },
    runner::StepRunner,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Messages sent from job tasks back to the orchestrator
#[derive(Debug)]
enum JobMessage {
    Started { instance: JobInstance },
    Finished { result: JobResult },
}

/// Outcome of waiting for a concurrency slot
enum Slot {
    Free(Option<OwnedSemaphorePermit>),
    Cancelled,
}

/// Runs every job instance of a pipeline and aggregates the outcome
pub struct PipelineOrchestrator<R> {
    runner: Arc<R>,
    max_parallel: Option<usize>,
    events: EventEmitter,
}

impl<R: StepRunner + 'static> PipelineOrchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self::with_shared_runner(Arc::new(runner))
    }

    pub fn with_shared_runner(runner: Arc<R>) -> Self {
        Self {
            runner,
            max_parallel: None,
            events: EventEmitter::new(),
        }
    }

    /// Override the pipeline's concurrency limit
    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(handler);
    }

    /// Run the pipeline to completion
    pub async fn run(&self, pipeline: &Pipeline) -> Result<PipelineResult, ConfigError> {
        self.run_with_cancellation(pipeline, CancellationToken::new())
            .await
    }

    /// Run the pipeline, stopping early when `cancel` fires.
    ///
    /// Configuration errors are returned before any job starts. Job and step
    /// failures never surface as `Err`; they are part of the result.
    pub async fn run_with_cancellation(
        &self,
        pipeline: &Pipeline,
        cancel: CancellationToken,
    ) -> Result<PipelineResult, ConfigError> {
        pipeline.validate()?;
        let limit = self.max_parallel.or(pipeline.max_parallel);
        if limit == Some(0) {
            return Err(ConfigError::InvalidMaxParallel);
        }

        let expansion = pipeline.jobs()?;
        let total = expansion.len();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            "Starting pipeline {} ({}): {} jobs, max parallel {}",
            pipeline.name,
            run_id,
            total,
            limit.map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );
        self.events.emit(ExecutionEvent::PipelineStarted {
            run_id,
            pipeline_name: pipeline.name.clone(),
            total_jobs: total,
        });

        let semaphore = limit.map(|n| Arc::new(Semaphore::new(n)));
        let executor = Arc::new(
            JobExecutor::new(self.runner.clone()).with_events(self.events.clone()),
        );
        let job = Arc::new(pipeline.job.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut states = vec![JobStatus::Pending; total];
        let mut results: Vec<Option<JobResult>> = vec![None; total];

        for instance in expansion {
            let index = instance.index;

            let permit = match Self::acquire_slot(semaphore.as_ref(), &cancel).await {
                Slot::Free(permit) => permit,
                Slot::Cancelled => {
                    debug!("Job {} cancelled before dispatch", instance);
                    Self::advance(&mut states, index, JobStatus::Cancelled);
                    let result = Self::cancelled_job(instance, &job);
                    self.events.emit(ExecutionEvent::JobCompleted {
                        result: result.clone(),
                    });
                    results[index] = Some(result);
                    continue;
                }
            };

            let tx = tx.clone();
            let executor = executor.clone();
            let job = job.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let _ = tx.send(JobMessage::Started {
                    instance: instance.clone(),
                });
                let result = executor.execute(&instance, &job, &cancel).await;
                let _ = tx.send(JobMessage::Finished { result });
            });
        }
        drop(tx);

        // Running jobs whose task ended without reporting back
        let mut in_flight: HashMap<usize, JobInstance> = HashMap::new();

        while let Some(message) = rx.recv().await {
            match message {
                JobMessage::Started { instance } => {
                    if Self::advance(&mut states, instance.index, JobStatus::Running) {
                        in_flight.insert(instance.index, instance);
                    }
                }
                JobMessage::Finished { result } => {
                    let index = result.instance.index;
                    if Self::advance(&mut states, index, result.status) {
                        in_flight.remove(&index);
                        results[index] = Some(result);
                    }
                }
            }
        }

        for (index, instance) in in_flight {
            error!("Job {} terminated without a result", instance);
            Self::advance(&mut states, index, JobStatus::Failure);
            let result =
                JobResult::aborted(instance, "job task terminated unexpectedly".to_string());
            self.events.emit(ExecutionEvent::JobCompleted {
                result: result.clone(),
            });
            results[index] = Some(result);
        }

        debug_assert!(states.iter().all(JobStatus::is_terminal));
        let jobs: Vec<JobResult> = results.into_iter().flatten().collect();
        debug_assert_eq!(jobs.len(), total);

        let result = PipelineResult::new(
            run_id,
            pipeline.name.clone(),
            jobs,
            cancel.is_cancelled(),
            started_at,
        );

        info!(
            "Pipeline {} finished: {:?} ({} succeeded, {} failed, {} cancelled)",
            pipeline.name,
            result.status,
            result.count(JobStatus::Success),
            result.count(JobStatus::Failure),
            result.count(JobStatus::Cancelled)
        );
        self.events.emit(ExecutionEvent::PipelineCompleted {
            run_id,
            status: result.status,
        });

        Ok(result)
    }

    /// Wait for a free slot, giving up as soon as cancellation is requested
    async fn acquire_slot(semaphore: Option<&Arc<Semaphore>>, cancel: &CancellationToken) -> Slot {
        if cancel.is_cancelled() {
            return Slot::Cancelled;
        }

        let Some(semaphore) = semaphore else {
            return Slot::Free(None);
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Slot::Cancelled,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => Slot::Free(Some(permit)),
                Err(_) => {
                    warn!("Job semaphore closed, treating remaining jobs as cancelled");
                    Slot::Cancelled
                }
            },
        }
    }

    /// Record a lifecycle transition for a job, returning whether it was allowed.
    ///
    /// Messages that would break the lifecycle are dropped, so a job's
    /// result is recorded at most once.
    fn advance(states: &mut [JobStatus], index: usize, to: JobStatus) -> bool {
        match states[index].transition(to) {
            Ok(next) => {
                states[index] = next;
                true
            }
            Err(e) => {
                error!("Job #{}: {}", index, e);
                false
            }
        }
    }

    /// Result for a job that was never dispatched
    fn cancelled_job(instance: JobInstance, job: &JobDefinition) -> JobResult {
        let steps = job
            .steps
            .iter()
            .map(|s| StepResult::not_run(&s.name, &s.action, StepStatus::Cancelled))
            .collect();
        JobResult::from_steps(instance, steps)
    }
}
