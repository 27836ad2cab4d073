//! Pipeline configuration from YAML

use crate::core::{
    error::ConfigError,
    job::JobDefinition,
    matrix::{Axis, Matrix},
    pipeline::Pipeline,
    step::{Step, COMMAND_PARAM, RUN_ACTION},
};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Build matrix: axis name -> list of values, in declaration order
    #[serde(default)]
    pub matrix: Mapping,

    /// Steps run for every matrix cell
    pub steps: Vec<StepConfig>,

    /// Maximum number of jobs running at once (unbounded when absent)
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Abort a job's remaining steps after its first failure
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Step name
    pub name: String,

    /// Action identifier
    #[serde(default)]
    pub uses: Option<String>,

    /// Shell command (shorthand for the `run` action)
    #[serde(default)]
    pub run: Option<String>,

    /// Action parameters
    #[serde(default)]
    pub with: BTreeMap<String, Value>,
}

fn default_fail_fast() -> bool {
    true
}

/// Render a YAML scalar as a plain string
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_pipeline()?.validate()
    }

    /// Build the matrix, keeping axis declaration order
    pub fn to_matrix(&self) -> Result<Matrix, ConfigError> {
        let mut matrix = Matrix::new();

        for (key, value) in &self.matrix {
            let name = scalar_to_string(key).ok_or_else(|| ConfigError::InvalidAxisValue {
                axis: format!("{:?}", key),
                reason: "axis name must be a string".to_string(),
            })?;

            let Value::Sequence(items) = value else {
                return Err(ConfigError::InvalidAxisValue {
                    axis: name,
                    reason: "expected a list of values".to_string(),
                });
            };

            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = scalar_to_string(item).ok_or_else(|| ConfigError::InvalidAxisValue {
                    axis: name.clone(),
                    reason: "values must be strings, numbers or booleans".to_string(),
                })?;
                values.push(value);
            }

            matrix.push_axis(Axis::new(name, values));
        }

        Ok(matrix)
    }

    /// Build the job definition from the step list
    pub fn to_job(&self) -> Result<JobDefinition, ConfigError> {
        let steps = self
            .steps
            .iter()
            .map(StepConfig::to_step)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobDefinition::new(steps).with_fail_fast(self.fail_fast))
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Result<Pipeline, ConfigError> {
        Ok(Pipeline::new(self.name.clone(), self.to_matrix()?, self.to_job()?)
            .with_max_parallel(self.max_parallel))
    }
}

impl StepConfig {
    /// Convert a step config to a Step
    pub fn to_step(&self) -> Result<Step, ConfigError> {
        let mut step = match (&self.uses, &self.run) {
            (Some(action), None) => Step::new(self.name.clone(), action.clone()),
            (None, Some(command)) => Step::run(self.name.clone(), command.clone()),
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidStep {
                    step: self.name.clone(),
                    reason: "'uses' and 'run' are mutually exclusive".to_string(),
                })
            }
            (None, None) => {
                return Err(ConfigError::InvalidStep {
                    step: self.name.clone(),
                    reason: "one of 'uses' or 'run' is required".to_string(),
                })
            }
        };

        for (key, value) in &self.with {
            if self.run.is_some() && key == COMMAND_PARAM {
                return Err(ConfigError::InvalidStep {
                    step: self.name.clone(),
                    reason: format!("'{}' is reserved for '{}' steps", COMMAND_PARAM, RUN_ACTION),
                });
            }
            let value = scalar_to_string(value).ok_or_else(|| ConfigError::InvalidStep {
                step: self.name.clone(),
                reason: format!("parameter '{}' must be a scalar", key),
            })?;
            step.params.insert(key.clone(), value);
        }

        Ok(step)
    }
}
