//! Scenario-based tests for matrix-pipeline

mod cancellation;
mod matrix_expansion;
mod rust_ci;
