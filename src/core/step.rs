//! Step domain model

use crate::core::{error::ConfigError, matrix::{JobInstance, Matrix}};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Action id used for `run:` shell steps
pub const RUN_ACTION: &str = "run";

/// Parameter carrying the command of a `run:` step
pub const COMMAND_PARAM: &str = "command";

/// A single step of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step name, unique within the job
    pub name: String,

    /// Action identifier handed to the step runner
    pub action: String,

    /// Action parameters, may contain `${{ matrix.<axis> }}` references
    pub params: BTreeMap<String, String>,
}

fn matrix_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{\{\s*matrix\.([A-Za-z0-9_-]+)\s*\}\}")
            .expect("matrix reference pattern is valid")
    })
}

impl Step {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    /// Shell command step
    pub fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(name, RUN_ACTION).with_param(COMMAND_PARAM, command)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Axis names referenced by the parameters
    pub fn matrix_references(&self) -> Vec<String> {
        let mut axes: Vec<String> = self
            .params
            .values()
            .flat_map(|value| matrix_reference().captures_iter(value))
            .map(|caps| caps[1].to_string())
            .collect();
        axes.sort();
        axes.dedup();
        axes
    }

    /// Check the step against the matrix it will be expanded with
    pub fn validate(&self, matrix: &Matrix) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidStep {
                step: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.action.trim().is_empty() {
            return Err(ConfigError::InvalidStep {
                step: self.name.clone(),
                reason: "action must not be empty".to_string(),
            });
        }

        for axis in self.matrix_references() {
            if matrix.axis(&axis).is_none() {
                return Err(ConfigError::UnknownMatrixReference {
                    step: self.name.clone(),
                    axis,
                });
            }
        }

        Ok(())
    }

    /// Render the parameters for one job instance.
    ///
    /// References to axes the instance does not assign are left as-is;
    /// `validate` rejects those before a run starts.
    pub fn render_params(&self, instance: &JobInstance) -> BTreeMap<String, String> {
        self.params
            .iter()
            .map(|(key, value)| {
                let rendered = matrix_reference().replace_all(value, |caps: &regex::Captures| {
                    instance
                        .get(&caps[1])
                        .map(str::to_string)
                        .unwrap_or_else(|| caps[0].to_string())
                });
                (key.clone(), rendered.into_owned())
            })
            .collect()
    }
}
