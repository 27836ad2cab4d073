//! Dry-run step runner

use crate::runner::{RunOutput, RunnerError, StepRunner};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Succeeds for every action and reports what would have run
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

#[async_trait]
impl StepRunner for DryRunRunner {
    async fn run(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RunOutput, RunnerError> {
        debug!("Dry run: {} {:?}", action, params);

        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        Ok(RunOutput::success(format!(
            "[dry-run] {} {}",
            action,
            rendered.join(" ")
        )))
    }
}
