//! Assignments: named groups of tests averaged with their own scheme.

use serde::Deserialize;

use crate::error::{GradeError, GradeResult};
use crate::grading::assessment::Test;
use crate::grading::scheme::{GradedItem, GradingScheme};
use crate::roster::MergedGradebook;

/// What happens to missing scores before a scheme averages them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Missed work counts as zero.
    #[default]
    Zero,
    /// Missed work is left out of the average.
    Exclude,
}

impl MissingPolicy {
    pub fn apply(self, score: Option<f64>) -> Option<f64> {
        match self {
            MissingPolicy::Zero => Some(score.unwrap_or(0.0)),
            MissingPolicy::Exclude => score,
        }
    }
}

/// A value given once for all tests of an assignment, or once per test.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PerTest<T> {
    Uniform(T),
    Each(Vec<T>),
}

impl<T: Clone> PerTest<T> {
    fn expand(&self, assignment: &str, field: &'static str, tests: usize) -> GradeResult<Vec<T>> {
        match self {
            PerTest::Uniform(v) => Ok(vec![v.clone(); tests]),
            PerTest::Each(values) if values.len() == tests => Ok(values.clone()),
            PerTest::Each(values) => Err(GradeError::TemplateMismatch {
                assignment: assignment.to_string(),
                field,
                tests,
                given: values.len(),
            }),
        }
    }
}

/// Average of one student on one assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentAverage {
    /// `None` only when every test was missed and missing scores are excluded.
    pub fraction: Option<f64>,
    /// Tests with no score in any version.
    pub missed: usize,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    name: String,
    tests: Vec<Test>,
    scheme: GradingScheme,
    scaling: f64,
    missing: MissingPolicy,
}

impl Assignment {
    /// Builds an assignment from explicit tests. The average is displayed
    /// out of the common max points, or out of 100 when tests differ.
    pub fn new(name: impl Into<String>, tests: Vec<Test>) -> Self {
        let scaling = match tests.split_first() {
            Some((first, rest)) if rest.iter().all(|t| t.max_points() == first.max_points()) => {
                first.max_points()
            }
            _ => 100.0,
        };
        Self {
            name: name.into(),
            tests,
            scheme: GradingScheme::default(),
            scaling,
            missing: MissingPolicy::default(),
        }
    }

    /// One test whose column is named like the assignment.
    pub fn single(name: &str, max_points: f64) -> GradeResult<Self> {
        Self::templated(name, None, PerTest::Uniform(max_points), PerTest::Uniform(1))
    }

    /// `count` tests named `"{name} {i}"`, all out of `max_points`.
    pub fn uniform(name: &str, max_points: f64, count: usize) -> GradeResult<Self> {
        Self::templated(
            name,
            Some(count),
            PerTest::Uniform(max_points),
            PerTest::Uniform(1),
        )
    }

    /// General template: `count = None` means a single test named `name`.
    pub fn templated(
        name: &str,
        count: Option<usize>,
        max_points: PerTest<f64>,
        versions: PerTest<usize>,
    ) -> GradeResult<Self> {
        let names: Vec<String> = match count {
            None => vec![name.to_string()],
            Some(n) => (1..=n).map(|i| format!("{name} {i}")).collect(),
        };
        let max_points_each = max_points.expand(name, "max_points", names.len())?;
        let versions_each = versions.expand(name, "versions", names.len())?;

        let tests = names
            .into_iter()
            .zip(max_points_each)
            .zip(versions_each)
            .map(|((test, max), v)| Test::new(test, max)?.with_versions(v))
            .collect::<GradeResult<Vec<_>>>()?;

        let mut assignment = Self::new(name, tests);
        if let PerTest::Each(_) = max_points {
            assignment.scaling = 100.0;
        }
        Ok(assignment)
    }

    pub fn with_scheme(mut self, scheme: GradingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_scaling(mut self, scaling: f64) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_missing_policy(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn scheme(&self) -> &GradingScheme {
        &self.scheme
    }

    /// Points the displayed average is out of.
    pub fn scaling(&self) -> f64 {
        self.scaling
    }

    /// Collapsed scores, one column per test, each in roster order.
    pub fn collapse(&self, gradebook: &MergedGradebook) -> GradeResult<Vec<Vec<Option<f64>>>> {
        self.tests.iter().map(|t| t.collapse(gradebook)).collect()
    }

    /// Averages one student's collapsed scores, given in test order.
    pub fn average(&self, scores: &[Option<f64>]) -> GradeResult<AssignmentAverage> {
        if scores.len() != self.tests.len() {
            return Err(GradeError::TemplateMismatch {
                assignment: self.name.clone(),
                field: "score",
                tests: self.tests.len(),
                given: scores.len(),
            });
        }

        let missed = scores.iter().filter(|s| s.is_none()).count();
        if self.missing == MissingPolicy::Exclude && missed == scores.len() && missed > 0 {
            return Ok(AssignmentAverage {
                fraction: None,
                missed,
            });
        }

        let items: Vec<GradedItem> = self
            .tests
            .iter()
            .zip(scores)
            .map(|(test, &score)| {
                GradedItem::new(test.name(), self.missing.apply(score), test.max_points())
            })
            .collect();

        Ok(AssignmentAverage {
            fraction: Some(self.scheme.apply(&items)?),
            missed,
        })
    }
}
