//! Graded items and collapsing of their version columns.

use crate::error::{GradeError, GradeResult};
use crate::roster::MergedGradebook;

pub const DEFAULT_VERSION_SEPARATOR: &str = " - v";

/// One graded item, possibly handed out in several versions.
///
/// A single-version test reads the column named exactly `name`; otherwise the
/// columns are `"{name}{separator}{i}"` for `i` in `1..=versions`.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    name: String,
    max_points: f64,
    versions: usize,
    version_separator: String,
}

impl Test {
    pub fn new(name: impl Into<String>, max_points: f64) -> GradeResult<Self> {
        let name = name.into();
        if !(max_points.is_finite() && max_points > 0.0) {
            return Err(GradeError::InvalidMaxPoints {
                test: name,
                value: max_points,
            });
        }
        Ok(Self {
            name,
            max_points,
            versions: 1,
            version_separator: DEFAULT_VERSION_SEPARATOR.to_string(),
        })
    }

    /// # Errors
    ///
    /// [`GradeError::InvalidVersionCount`] for zero versions.
    pub fn with_versions(mut self, versions: usize) -> GradeResult<Self> {
        if versions == 0 {
            return Err(GradeError::InvalidVersionCount { test: self.name });
        }
        self.versions = versions;
        Ok(self)
    }

    pub fn with_version_separator(mut self, separator: &str) -> Self {
        self.version_separator = separator.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_points(&self) -> f64 {
        self.max_points
    }

    pub fn versions(&self) -> usize {
        self.versions
    }

    /// Gradebook columns holding this test's scores.
    pub fn columns(&self) -> Vec<String> {
        if self.versions == 1 {
            vec![self.name.clone()]
        } else {
            (1..=self.versions)
                .map(|i| format!("{}{}{}", self.name, self.version_separator, i))
                .collect()
        }
    }

    /// Collapses the version columns into one score per student, in roster order.
    ///
    /// A student with no score in any version gets `None`. A student with
    /// scores in more than one version is a data error.
    pub fn collapse(&self, gradebook: &MergedGradebook) -> GradeResult<Vec<Option<f64>>> {
        let columns = self.columns();
        let indices = columns
            .iter()
            .map(|c| {
                gradebook
                    .column_index(c)
                    .ok_or_else(|| GradeError::MissingColumn {
                        column: c.clone(),
                        context: format!("the merged gradebook (test `{}`)", self.name),
                    })
            })
            .collect::<GradeResult<Vec<_>>>()?;

        gradebook
            .roster()
            .iter()
            .enumerate()
            .map(|(row, student)| {
                let mut found: Vec<(&str, f64)> = Vec::new();
                for (column, &col) in columns.iter().zip(&indices) {
                    let Some(raw) = gradebook.cell(row, col) else {
                        continue;
                    };
                    let score = raw
                        .parse::<f64>()
                        .ok()
                        .filter(|s| s.is_finite())
                        .ok_or_else(|| GradeError::InvalidScore {
                            column: column.clone(),
                            student: student.key.to_string(),
                            value: raw.to_string(),
                        })?;
                    found.push((column.as_str(), score));
                }

                match found.as_slice() {
                    [] => Ok(None),
                    [(_, score)] => Ok(Some(*score)),
                    _ => Err(GradeError::AmbiguousVersion {
                        test: self.name.clone(),
                        student: student.key.to_string(),
                        versions: found.iter().map(|(c, _)| c.to_string()).collect(),
                    }),
                }
            })
            .collect()
    }
}
