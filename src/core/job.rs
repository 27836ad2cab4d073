//! Job definition shared by every matrix cell

use crate::core::{error::ConfigError, matrix::Matrix, step::Step};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered steps run for each job instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub steps: Vec<Step>,

    /// Abort the remaining steps of a job after its first failure
    pub fail_fast: bool,
}

impl JobDefinition {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            fail_fast: true,
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Validate step list against the matrix
    pub fn validate(&self, matrix: &Matrix) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptySteps);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(ConfigError::DuplicateStep {
                    name: step.name.clone(),
                });
            }
            step.validate(matrix)?;
        }

        Ok(())
    }
}
