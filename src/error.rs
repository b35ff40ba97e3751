//! Data-integrity faults raised by the grading engine.
//!
//! None of these are recovered from inside the library: each one means an
//! input file or a call argument has to be corrected before a grade can be
//! trusted.

/// Result alias used across the library.
pub type GradeResult<T> = Result<T, GradeError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    /// A row has neither an ID nor an email to derive a student key from.
    #[error("row {row} of `{source_name}` has neither an ID nor an email")]
    MissingIdentity { source_name: String, row: usize },

    /// A full-name cell could not be split and no ID/email exists to key the row.
    #[error("row {row} of `{source_name}`: could not split full name `{name}`")]
    NameSplit {
        source_name: String,
        row: usize,
        name: String,
    },

    /// A gradebook preset key that is not recognised.
    #[error("unknown gradebook format `{0}` (expected one of: GS, WA)")]
    UnknownFormat(String),

    /// A student has scores in more than one version of the same test.
    #[error("student `{student}` has scores in several versions of `{test}`: {versions:?}")]
    AmbiguousVersion {
        test: String,
        student: String,
        versions: Vec<String>,
    },

    /// Weights do not line up with the items they should weigh.
    #[error("weight mismatch: {0}")]
    WeightMismatch(String),

    /// Not enough items left after dropping.
    #[error("cannot drop {dropped} of {available} items")]
    InsufficientItems { dropped: usize, available: usize },

    #[error("{thresholds} thresholds given for {letters} letters")]
    ThresholdMismatch { thresholds: usize, letters: usize },

    #[error("thresholds must be strictly decreasing (position {position}: {value})")]
    UnsortedThresholds { position: usize, value: f64 },

    /// Two rows of one gradebook resolve to the same student key.
    #[error("student key `{key}` appears more than once in `{source_name}`")]
    DuplicateKey { source_name: String, key: String },

    #[error("column `{column}` not found in {context}")]
    MissingColumn { column: String, context: String },

    #[error("`{value}` in column `{column}` for student `{student}` is not a number")]
    InvalidScore {
        column: String,
        student: String,
        value: String,
    },

    #[error("max points for `{test}` must be a positive number, got {value}")]
    InvalidMaxPoints { test: String, value: f64 },

    #[error("test `{test}` must have at least one version")]
    InvalidVersionCount { test: String },

    /// A per-test list in an assignment template has the wrong length.
    #[error("assignment `{assignment}` has {tests} tests but {given} {field} entries")]
    TemplateMismatch {
        assignment: String,
        field: &'static str,
        tests: usize,
        given: usize,
    },

    #[error("letter `{0}` is not part of the letter scale")]
    UnknownLetter(String),
}
