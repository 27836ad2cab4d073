//! Execution events emitted while a pipeline runs

use crate::core::{JobInstance, JobResult, PipelineStatus, StepResult};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        run_id: Uuid,
        pipeline_name: String,
        total_jobs: usize,
    },
    JobStarted {
        job: JobInstance,
    },
    StepStarted {
        job: JobInstance,
        step: String,
    },
    StepFinished {
        job: JobInstance,
        result: StepResult,
    },
    JobCompleted {
        result: JobResult,
    },
    PipelineCompleted {
        run_id: Uuid,
        status: PipelineStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Fan-out of events to registered handlers.
///
/// Handlers are called synchronously on the task that emits the event, so
/// they may run concurrently for different jobs.
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: Arc<Vec<EventHandler>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler
    pub fn add_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.handlers).push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: ExecutionEvent) {
        for handler in self.handlers.iter() {
            handler(event.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
