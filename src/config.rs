//! Course definition file.
//!
//! Stored as JSON next to the gradebook exports:
//! ```json
//! {
//!   "gradebooks": [
//!     { "path": "GS.csv", "file_type": "GS" },
//!     { "path": "WA.csv", "file_type": "WA" }
//!   ],
//!   "assignments": [
//!     { "name": "WebAssign", "max_points": 100, "scaling": 5 },
//!     { "name": "Quiz", "max_points": 20, "tests": 10, "versions": 2,
//!       "scheme": { "mode": "drop_lowest", "count": 2 } }
//!   ],
//!   "scheme": { "mode": "weighted", "weights": [1, 3] },
//!   "include_others": ["Comments"]
//! }
//! ```
//! Relative gradebook paths are resolved against the file's directory.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::GradeResult;
use crate::grading::{
    Assignment, GradeOptions, GradingScheme, LetterScale, MissingPolicy, PerTest, Section, Weights,
};
use crate::roster::{FileType, Gradebook, HeaderMapping};

#[derive(Debug, Clone, Deserialize)]
pub struct CourseConfig {
    /// First entry is the reference roster.
    pub gradebooks: Vec<GradebookConfig>,
    pub assignments: Vec<AssignmentConfig>,
    #[serde(default)]
    pub scheme: SchemeConfig,
    #[serde(default)]
    pub missing: MissingPolicy,
    #[serde(default)]
    pub thresholds: Option<Vec<f64>>,
    #[serde(default)]
    pub letters: Option<Vec<String>>,
    #[serde(default)]
    pub include: Option<Vec<Section>>,
    #[serde(default)]
    pub include_others: Vec<String>,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradebookConfig {
    pub path: PathBuf,
    /// Preset key, e.g. `"GS"` or `"WA"`.
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub columns: Option<HeaderMapping>,
}

impl GradebookConfig {
    pub fn mapping(&self) -> Result<HeaderMapping> {
        match (&self.file_type, &self.columns) {
            (Some(file_type), None) => Ok(file_type.parse::<FileType>()?.mapping()),
            (None, Some(columns)) => Ok(columns.clone()),
            (Some(_), Some(_)) => bail!(
                "gradebook {} sets both `file_type` and `columns`",
                self.path.display()
            ),
            (None, None) => bail!(
                "gradebook {} needs either `file_type` or `columns`",
                self.path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentConfig {
    pub name: String,
    pub max_points: PerTest<f64>,
    /// Number of tests; omitted means one test named like the assignment.
    #[serde(default)]
    pub tests: Option<usize>,
    #[serde(default = "single_version")]
    pub versions: PerTest<usize>,
    #[serde(default)]
    pub scheme: SchemeConfig,
    #[serde(default)]
    pub scaling: Option<f64>,
    #[serde(default)]
    pub missing: MissingPolicy,
}

fn single_version() -> PerTest<usize> {
    PerTest::Uniform(1)
}

impl AssignmentConfig {
    pub fn build(&self) -> GradeResult<Assignment> {
        let mut assignment = Assignment::templated(
            &self.name,
            self.tests,
            self.max_points.clone(),
            self.versions.clone(),
        )?
        .with_scheme(GradingScheme::from(&self.scheme))
        .with_missing_policy(self.missing);
        if let Some(scaling) = self.scaling {
            assignment = assignment.with_scaling(scaling);
        }
        Ok(assignment)
    }
}

/// Grading schemes expressible in a file. Custom functions are code-only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SchemeConfig {
    #[default]
    Unweighted,
    Weighted {
        weights: WeightsConfig,
    },
    DropLowest {
        count: usize,
    },
    BestOf {
        schemes: Vec<SchemeConfig>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WeightsConfig {
    Positional(Vec<f64>),
    Named(BTreeMap<String, f64>),
}

impl From<&SchemeConfig> for GradingScheme {
    fn from(config: &SchemeConfig) -> Self {
        match config {
            SchemeConfig::Unweighted => GradingScheme::Unweighted,
            SchemeConfig::Weighted { weights } => GradingScheme::Weighted(match weights {
                WeightsConfig::Positional(w) => Weights::Positional(w.clone()),
                WeightsConfig::Named(w) => Weights::Named(w.clone()),
            }),
            SchemeConfig::DropLowest { count } => GradingScheme::DropLowest(*count),
            SchemeConfig::BestOf { schemes } => {
                GradingScheme::BestOf(schemes.iter().map(GradingScheme::from).collect())
            }
        }
    }
}

impl CourseConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::from_json(&content)
            .with_context(|| format!("invalid course config {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        if config.gradebooks.is_empty() {
            bail!("at least one gradebook is required");
        }
        Ok(config)
    }

    /// Loads every gradebook, reference first.
    pub fn load_gradebooks(&self) -> Result<Vec<Gradebook>> {
        self.gradebooks
            .iter()
            .map(|g| {
                let path = self.base_dir.join(&g.path);
                Gradebook::load(&path, &g.mapping()?)
            })
            .collect()
    }

    pub fn build_assignments(&self) -> GradeResult<Vec<Assignment>> {
        self.assignments.iter().map(AssignmentConfig::build).collect()
    }

    pub fn grade_options(&self) -> GradeResult<GradeOptions> {
        let defaults = LetterScale::default();
        let scale = LetterScale::new(
            self.thresholds
                .clone()
                .unwrap_or_else(|| defaults.thresholds().to_vec()),
            self.letters
                .clone()
                .unwrap_or_else(|| defaults.letters().to_vec()),
        )?;

        let mut options = GradeOptions::default()
            .with_scheme(GradingScheme::from(&self.scheme))
            .with_others(self.include_others.iter().cloned())
            .with_missing_policy(self.missing);
        options.scale = scale;
        if let Some(include) = &self.include {
            options = options.with_include(include.iter().copied());
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GradeError;

    const SAMPLE: &str = r#"{
        "gradebooks": [
            { "path": "GS.csv", "file_type": "GS" },
            { "path": "extra.csv", "columns": {
                "names": { "split": { "last": "Surname", "first": "Given" } },
                "email": "Mail",
                "missing_values": ["-"]
            } }
        ],
        "assignments": [
            { "name": "WebAssign", "max_points": 100, "scaling": 5 },
            { "name": "Quiz", "max_points": 20, "tests": 3, "versions": [2, 1, 1],
              "scheme": { "mode": "drop_lowest", "count": 1 } }
        ],
        "scheme": { "mode": "best_of", "schemes": [
            { "mode": "weighted", "weights": [1, 3] },
            { "mode": "weighted", "weights": { "WebAssign": 1, "Quiz": 1 } }
        ] },
        "thresholds": [90, 0],
        "letters": ["P", "F"],
        "include": ["final", "letter"]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = CourseConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.gradebooks.len(), 2);
        assert!(config.gradebooks[0].mapping().is_ok());
        assert_eq!(
            config.gradebooks[1].mapping().unwrap(),
            HeaderMapping::split_names("Surname", "Given")
                .with_email("Mail")
                .with_missing_values(&["-"])
        );

        let assignments = config.build_assignments().unwrap();
        assert_eq!(assignments[0].scaling(), 5.0);
        assert_eq!(assignments[1].tests().len(), 3);
        assert_eq!(assignments[1].tests()[0].versions(), 2);

        let options = config.grade_options().unwrap();
        assert_eq!(options.scale.letter(95.0), "P");
        assert_eq!(
            options.include.iter().copied().collect::<Vec<_>>(),
            vec![Section::Final, Section::Letter]
        );
        assert!(matches!(options.scheme, GradingScheme::BestOf(ref s) if s.len() == 2));
    }

    #[test]
    fn test_unknown_file_type() {
        let config = CourseConfig::from_json(
            r#"{ "gradebooks": [{ "path": "a.csv", "file_type": "XLS" }], "assignments": [] }"#,
        )
        .unwrap();
        let err = config.gradebooks[0].mapping().unwrap_err();
        assert_eq!(
            err.downcast_ref::<GradeError>(),
            Some(&GradeError::UnknownFormat("XLS".into()))
        );
    }

    #[test]
    fn test_zero_versions_rejected() {
        let config = CourseConfig::from_json(
            r#"{ "gradebooks": [{ "path": "a.csv", "file_type": "GS" }],
                 "assignments": [{ "name": "Quiz", "max_points": 10, "tests": 2, "versions": [1, 0] }] }"#,
        )
        .unwrap();
        assert_eq!(
            config.build_assignments().unwrap_err(),
            GradeError::InvalidVersionCount {
                test: "Quiz 2".into()
            }
        );
    }

    #[test]
    fn test_requires_a_gradebook() {
        assert!(CourseConfig::from_json(r#"{ "gradebooks": [], "assignments": [] }"#).is_err());
    }

    #[test]
    fn test_mismatched_letters_rejected() {
        let config = CourseConfig::from_json(
            r#"{ "gradebooks": [{ "path": "a.csv", "file_type": "GS" }],
                 "assignments": [], "thresholds": [90, 80] }"#,
        )
        .unwrap();
        assert!(matches!(
            config.grade_options(),
            Err(GradeError::ThresholdMismatch { .. })
        ));
    }
}
