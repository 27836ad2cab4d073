//! Runner output and error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a runner cannot run an action at all
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Action '{action}' requires parameter '{param}'")]
    MissingParameter { action: String, param: String },

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

/// Outcome of an action that ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Whether the action succeeded
    pub success: bool,

    /// Captured output
    pub output: String,
}

impl RunOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}
