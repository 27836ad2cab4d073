//! Shell step runner - runs `run:` steps as subprocesses

use crate::core::step::{COMMAND_PARAM, RUN_ACTION};
use crate::runner::{RunOutput, RunnerError, StepRunner};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Optional parameter selecting the shell binary (invoked with `-c`)
pub const SHELL_PARAM: &str = "shell";

/// Optional parameter setting the working directory
pub const WORKING_DIRECTORY_PARAM: &str = "working-directory";

/// Configuration for the shell runner
#[derive(Debug, Clone)]
pub struct ShellRunnerConfig {
    /// Timeout for each step in seconds
    pub timeout_secs: u64,
}

impl Default for ShellRunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
        }
    }
}

impl ShellRunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Runs the `run` action through the platform shell
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    config: ShellRunnerConfig,
}

impl ShellRunner {
    pub fn new(config: ShellRunnerConfig) -> Self {
        Self { config }
    }

    fn command(params: &BTreeMap<String, String>, script: &str) -> Command {
        let mut command = match params.get(SHELL_PARAM) {
            Some(shell) => {
                let mut c = Command::new(shell);
                c.arg("-c");
                c
            }
            None if cfg!(windows) => {
                let mut c = Command::new("cmd");
                c.arg("/C");
                c
            }
            None => {
                let mut c = Command::new("sh");
                c.arg("-c");
                c
            }
        };
        command.arg(script).kill_on_drop(true);

        if let Some(dir) = params.get(WORKING_DIRECTORY_PARAM) {
            command.current_dir(dir);
        }

        command
    }
}

#[async_trait]
impl StepRunner for ShellRunner {
    /// Run a shell command and capture stdout and stderr
    ///
    /// # Errors
    /// Returns `RunnerError` if:
    /// - The action is anything other than `run`
    /// - The `command` parameter is missing
    /// - The shell cannot be spawned
    /// - The command times out
    ///
    /// A command that runs and exits non-zero is a failed `RunOutput`,
    /// not an error.
    async fn run(
        &self,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<RunOutput, RunnerError> {
        if action != RUN_ACTION {
            return Err(RunnerError::ActionNotFound(action.to_string()));
        }

        let script = params
            .get(COMMAND_PARAM)
            .ok_or_else(|| RunnerError::MissingParameter {
                action: action.to_string(),
                param: COMMAND_PARAM.to_string(),
            })?;

        debug!("Spawning shell for command: {}", script);

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            Self::command(params, script).output(),
        )
        .await
        .map_err(|_| RunnerError::Timeout(self.config.timeout_secs))?
        .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            debug!("Command succeeded with {} bytes of output", text.len());
            Ok(RunOutput::success(text))
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            warn!("Command exited with code {}: {}", exit_code, script);
            text.push_str(&format!("\nProcess exited with code {}", exit_code));
            Ok(RunOutput::failure(text))
        }
    }
}
