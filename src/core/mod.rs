//! Core domain models
//!
//! This module defines the build matrix, job and step definitions,
//! and the result types produced by a pipeline run.

pub mod config;
pub mod error;
pub mod job;
pub mod matrix;
pub mod pipeline;
pub mod state;
pub mod step;

pub use error::ConfigError;
pub use job::*;
pub use matrix::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
