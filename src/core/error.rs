//! Configuration errors

use thiserror::Error;

/// Errors raised while loading or validating a pipeline definition.
///
/// All of these are fatal: they are reported before any job runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Matrix axis '{axis}' has no values")]
    EmptyAxis { axis: String },

    #[error("Duplicate matrix axis: {axis}")]
    DuplicateAxis { axis: String },

    #[error("Matrix axis '{axis}' lists value '{value}' more than once")]
    DuplicateAxisValue { axis: String, value: String },

    #[error("Matrix axis '{axis}' has an unsupported value: {reason}")]
    InvalidAxisValue { axis: String, reason: String },

    #[error("Unknown matrix axis: {axis}")]
    UnknownAxis { axis: String },

    #[error("Matrix axis '{axis}' has no value '{value}'")]
    UnknownAxisValue { axis: String, value: String },

    #[error("Matrix with {axes} axes expands to more jobs than can be counted")]
    MatrixTooLarge { axes: usize },

    #[error("Pipeline has no steps")]
    EmptySteps,

    #[error("Duplicate step name: {name}")]
    DuplicateStep { name: String },

    #[error("Step '{step}' is invalid: {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("Step '{step}' references unknown matrix axis '{axis}'")]
    UnknownMatrixReference { step: String, axis: String },

    #[error("max_parallel must be at least 1")]
    InvalidMaxParallel,

    #[error("Failed to parse pipeline YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to read pipeline file: {0}")]
    Io(#[from] std::io::Error),
}
