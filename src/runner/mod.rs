//! Step runners - the capability that actually performs a step's action

pub mod dry_run;
pub mod output;
pub mod shell;

use async_trait::async_trait;
use std::collections::BTreeMap;

pub use dry_run::DryRunRunner;
pub use output::{RunOutput, RunnerError};
pub use shell::{ShellRunner, ShellRunnerConfig};

/// Trait for step execution - allows for different implementations
///
/// `Ok` carries the outcome of an action that ran (successfully or not);
/// `Err` means the action could not be run at all.
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Run one action with its rendered parameters
    async fn run(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RunOutput, RunnerError>;
}

#[async_trait]
impl<R: StepRunner + ?Sized> StepRunner for std::sync::Arc<R> {
    async fn run(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RunOutput, RunnerError> {
        (**self).run(action, params).await
    }
}

#[async_trait]
impl<R: StepRunner + ?Sized> StepRunner for Box<R> {
    async fn run(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RunOutput, RunnerError> {
        (**self).run(action, params).await
    }
}
