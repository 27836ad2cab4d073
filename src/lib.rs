//! matrix-pipeline - a CI pipeline runner with build matrix expansion

pub mod cli;
pub mod core;
pub mod execution;
pub mod runner;

// Re-export commonly used types
pub use core::{
    Axis, ConfigError, JobDefinition, JobInstance, JobResult, JobStatus, Matrix, Pipeline,
    PipelineResult, PipelineStatus, Step, StepResult, StepStatus,
};
pub use execution::{ExecutionEvent, JobExecutor, PipelineOrchestrator};
pub use runner::{DryRunRunner, RunOutput, RunnerError, ShellRunner, StepRunner};
pub use tokio_util::sync::CancellationToken;
