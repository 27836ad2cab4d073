//! Pipeline domain model

use crate::core::{
    error::ConfigError,
    job::JobDefinition,
    matrix::{Matrix, MatrixExpansion},
};

/// One job definition fanned out over a build matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Build matrix
    pub matrix: Matrix,

    /// Steps shared by every job instance
    pub job: JobDefinition,

    /// Maximum number of concurrently running jobs (None = unbounded)
    pub max_parallel: Option<usize>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, matrix: Matrix, job: JobDefinition) -> Self {
        Self {
            name: name.into(),
            matrix,
            job,
            max_parallel: None,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Check the matrix, the steps and the concurrency limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matrix.validate()?;
        self.job.validate(&self.matrix)?;

        if self.max_parallel == Some(0) {
            return Err(ConfigError::InvalidMaxParallel);
        }

        Ok(())
    }

    /// Job instances of this pipeline, in expansion order
    pub fn jobs(&self) -> Result<MatrixExpansion<'_>, ConfigError> {
        self.matrix.expand()
    }
}
