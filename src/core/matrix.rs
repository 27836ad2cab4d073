//! Build matrix and its expansion into job instances

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One dimension of build variation, e.g. `os: [ubuntu-latest, windows-latest]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    /// Axis name as referenced by `${{ matrix.<name> }}`
    pub name: String,

    /// Values in declaration order
    pub values: Vec<String>,
}

impl Axis {
    pub fn new<N, I, V>(name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// The set of axes defining a job's variation space
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    axes: Vec<Axis>,
}

impl Matrix {
    /// Create an empty matrix (expands to a single job)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis, builder style
    pub fn with_axis<N, I, V>(mut self, name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.axes.push(Axis::new(name, values));
        self
    }

    /// Append an axis
    pub fn push_axis(&mut self, axis: Axis) {
        self.axes.push(axis);
    }

    /// Axes in declaration order
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Look up an axis by name
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Check axis invariants: unique names, non-empty and unique values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_axes = HashSet::new();
        for axis in &self.axes {
            if !seen_axes.insert(axis.name.as_str()) {
                return Err(ConfigError::DuplicateAxis {
                    axis: axis.name.clone(),
                });
            }
            if axis.values.is_empty() {
                return Err(ConfigError::EmptyAxis {
                    axis: axis.name.clone(),
                });
            }

            let mut seen_values = HashSet::new();
            for value in &axis.values {
                if !seen_values.insert(value.as_str()) {
                    return Err(ConfigError::DuplicateAxisValue {
                        axis: axis.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        if self.checked_job_count().is_none() {
            return Err(ConfigError::MatrixTooLarge {
                axes: self.axes.len(),
            });
        }
        Ok(())
    }

    /// Size of the product, or `None` if it overflows `usize`
    fn checked_job_count(&self) -> Option<usize> {
        self.axes
            .iter()
            .try_fold(1usize, |total, axis| total.checked_mul(axis.values.len()))
    }

    /// Number of job instances the matrix expands to, saturating at
    /// `usize::MAX` for a matrix that fails validation
    pub fn job_count(&self) -> usize {
        self.checked_job_count().unwrap_or(usize::MAX)
    }

    /// Expand into the Cartesian product of axis values.
    ///
    /// Instances are produced lazily, in lexicographic order over axis
    /// declaration order and then value order (the last axis varies
    /// fastest). The returned iterator can be cloned to restart.
    pub fn expand(&self) -> Result<MatrixExpansion<'_>, ConfigError> {
        self.validate()?;
        Ok(MatrixExpansion::new(&self.axes))
    }

    /// Narrow `axis` down to the single value `value`
    pub fn restrict(&mut self, axis: &str, value: &str) -> Result<(), ConfigError> {
        let target = self
            .axes
            .iter_mut()
            .find(|a| a.name == axis)
            .ok_or_else(|| ConfigError::UnknownAxis {
                axis: axis.to_string(),
            })?;

        if !target.values.iter().any(|v| v == value) {
            return Err(ConfigError::UnknownAxisValue {
                axis: axis.to_string(),
                value: value.to_string(),
            });
        }

        target.values = vec![value.to_string()];
        Ok(())
    }
}

/// A single axis assignment within a job instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub axis: String,
    pub value: String,
}

/// One concrete combination of axis values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobInstance {
    /// Position in expansion order
    pub index: usize,

    assignments: Vec<Assignment>,
}

impl JobInstance {
    pub fn new(index: usize, assignments: Vec<Assignment>) -> Self {
        Self { index, assignments }
    }

    /// Assigned value for an axis
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.axis == axis)
            .map(|a| a.value.as_str())
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Identity of the instance: its assigned values in axis order
    pub fn key(&self) -> Vec<&str> {
        self.assignments.iter().map(|a| a.value.as_str()).collect()
    }
}

impl fmt::Display for JobInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.assignments.is_empty() {
            return write!(f, "default");
        }
        write!(f, "({})", self.key().join(", "))
    }
}

/// Lazy iterator over the job instances of a matrix.
///
/// Works like an odometer: one cursor per axis, the last one advancing
/// first and carrying into the previous one when it wraps.
#[derive(Debug, Clone)]
pub struct MatrixExpansion<'a> {
    axes: &'a [Axis],
    cursor: Option<Vec<usize>>,
    index: usize,
    total: usize,
}

impl<'a> MatrixExpansion<'a> {
    fn new(axes: &'a [Axis]) -> Self {
        let total = axes
            .iter()
            .try_fold(1usize, |total, axis| total.checked_mul(axis.values.len()))
            .unwrap_or(0);
        let cursor = if total == 0 {
            None
        } else {
            Some(vec![0; axes.len()])
        };

        Self {
            axes,
            cursor,
            index: 0,
            total,
        }
    }

    fn advance(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };

        for position in (0..cursor.len()).rev() {
            cursor[position] += 1;
            if cursor[position] < self.axes[position].values.len() {
                return;
            }
            cursor[position] = 0;
        }

        // Every position wrapped (or there are no axes): exhausted
        self.cursor = None;
    }
}

impl Iterator for MatrixExpansion<'_> {
    type Item = JobInstance;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_ref()?;

        let assignments = self
            .axes
            .iter()
            .zip(cursor)
            .map(|(axis, &i)| Assignment {
                axis: axis.name.clone(),
                value: axis.values[i].clone(),
            })
            .collect();

        let instance = JobInstance::new(self.index, assignments);
        self.index += 1;
        self.advance();

        Some(instance)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MatrixExpansion<'_> {}
