//! Grade computation and letter grading.
//!
//! Tests are collapsed across their versions, averaged per assignment with
//! the assignment's [`GradingScheme`], combined into a final percentage with
//! the course scheme, and mapped to letters through a [`LetterScale`].

pub mod assessment;
pub mod assignment;
pub mod course;
pub mod letters;
pub mod scheme;
pub mod table;

pub use assessment::Test;
pub use assignment::{Assignment, AssignmentAverage, MissingPolicy, PerTest};
pub use course::{Course, GradeOptions};
pub use letters::LetterScale;
pub use scheme::{GradedItem, GradingScheme, Weights};
pub use table::{Cell, CourseSummary, GradeRow, GradeTable, Section};
