//! Test: Matrix Expansion - every combination exactly once, in a stable order

use matrix_pipeline::core::{ConfigError, Matrix};
use std::collections::HashSet;

fn matrix() -> Matrix {
    Matrix::new()
        .with_axis("os", ["linux", "macos", "windows"])
        .with_axis("toolchain", ["stable", "beta", "nightly"])
        .with_axis("features", ["default", "all"])
}

/// The product has one job per combination and no duplicates
#[test]
fn test_expansion_is_cartesian_product() {
    let matrix = matrix();
    let jobs: Vec<_> = matrix.expand().unwrap().collect();

    assert_eq!(jobs.len(), 3 * 3 * 2);
    assert_eq!(matrix.job_count(), jobs.len());

    let distinct: HashSet<Vec<&str>> = jobs.iter().map(|j| j.key()).collect();
    assert_eq!(distinct.len(), jobs.len());

    for (index, job) in jobs.iter().enumerate() {
        assert_eq!(job.index, index);
        assert_eq!(job.assignments().len(), 3);
    }
}

/// Last axis varies fastest, values keep declaration order
#[test]
fn test_expansion_order() {
    let matrix = matrix();
    let jobs: Vec<_> = matrix.expand().unwrap().collect();

    assert_eq!(jobs[0].key(), vec!["linux", "stable", "default"]);
    assert_eq!(jobs[1].key(), vec!["linux", "stable", "all"]);
    assert_eq!(jobs[2].key(), vec!["linux", "beta", "default"]);
    assert_eq!(jobs[17].key(), vec!["windows", "nightly", "all"]);
    assert_eq!(jobs[1].to_string(), "(linux, stable, all)");
}

/// Expanding twice yields the same sequence
#[test]
fn test_expansion_is_deterministic() {
    let matrix = matrix();
    let first: Vec<_> = matrix.expand().unwrap().collect();
    let second: Vec<_> = matrix.expand().unwrap().collect();
    assert_eq!(first, second);

    let expansion = matrix.expand().unwrap();
    let restarted: Vec<_> = expansion.clone().collect();
    assert_eq!(expansion.len(), 18);
    assert_eq!(restarted, first);
}

/// A matrix without axes runs a single job
#[test]
fn test_empty_matrix_is_single_job() {
    let jobs: Vec<_> = Matrix::new().expand().unwrap().collect();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].assignments().is_empty());
    assert_eq!(jobs[0].to_string(), "default");
}

/// An axis with no values is a configuration error, not an empty run
#[test]
fn test_empty_axis_rejected() {
    let matrix = Matrix::new()
        .with_axis("os", ["linux"])
        .with_axis("toolchain", Vec::<String>::new());

    assert!(matches!(
        matrix.expand().unwrap_err(),
        ConfigError::EmptyAxis { axis } if axis == "toolchain"
    ));
}

/// Restricting an axis narrows the product
#[test]
fn test_restrict_axis() {
    let mut matrix = matrix();
    matrix.restrict("toolchain", "nightly").unwrap();

    let jobs: Vec<_> = matrix.expand().unwrap().collect();
    assert_eq!(jobs.len(), 6);
    assert!(jobs.iter().all(|j| j.get("toolchain") == Some("nightly")));

    assert!(matches!(
        matrix.restrict("arch", "x86_64").unwrap_err(),
        ConfigError::UnknownAxis { .. }
    ));
    assert!(matches!(
        matrix.restrict("os", "freebsd").unwrap_err(),
        ConfigError::UnknownAxisValue { .. }
    ));
}
