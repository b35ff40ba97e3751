//! Course-level pipeline: merge, collapse, average, letter, project.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::error::{GradeError, GradeResult};
use crate::grading::assignment::{Assignment, AssignmentAverage, MissingPolicy};
use crate::grading::letters::LetterScale;
use crate::grading::scheme::{GradedItem, GradingScheme};
use crate::grading::table::{
    Cell, FINAL_GRADE, GradeRow, GradeTable, LETTER_GRADE, MISSED_SUFFIX, Section,
};
use crate::roster::format::IDENTITY_HEADERS;
use crate::roster::{Gradebook, Identity, MergedGradebook};

/// Arguments of [`Course::compute_grades`].
#[derive(Debug, Clone)]
pub struct GradeOptions {
    /// Combines assignment averages into the final grade.
    pub scheme: GradingScheme,
    pub scale: LetterScale,
    pub include: BTreeSet<Section>,
    /// Gradebook columns copied verbatim to the end of the output.
    pub include_others: Vec<String>,
    /// Applied to assignment averages before the course scheme sees them.
    pub missing: MissingPolicy,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            scheme: GradingScheme::default(),
            scale: LetterScale::default(),
            include: Section::defaults().into_iter().collect(),
            include_others: Vec::new(),
            missing: MissingPolicy::default(),
        }
    }
}

impl GradeOptions {
    pub fn with_scheme(mut self, scheme: GradingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Replaces the letter scale.
    ///
    /// # Errors
    ///
    /// [`GradeError::ThresholdMismatch`] or [`GradeError::UnsortedThresholds`].
    pub fn with_letters<S: Into<String>>(
        mut self,
        thresholds: Vec<f64>,
        letters: Vec<S>,
    ) -> GradeResult<Self> {
        self.scale = LetterScale::new(thresholds, letters)?;
        Ok(self)
    }

    pub fn with_include(mut self, include: impl IntoIterator<Item = Section>) -> Self {
        self.include = include.into_iter().collect();
        self
    }

    pub fn with_others<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.include_others = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_policy(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    fn includes(&self, section: Section) -> bool {
        self.include.contains(&section)
    }
}

/// A set of assignments graded over gradebooks joined onto a reference roster.
///
/// The merged gradebook is built once here; rebuild the course to pick up
/// changed inputs.
#[derive(Debug)]
pub struct Course<'g> {
    reference: &'g Gradebook,
    others: Vec<&'g Gradebook>,
    assignments: Vec<Assignment>,
    merged: MergedGradebook,
}

impl<'g> Course<'g> {
    /// `reference` defines the roster; `others` are left-joined onto it.
    #[tracing::instrument(skip_all, fields(reference = reference.name()))]
    pub fn new(
        reference: &'g Gradebook,
        others: impl IntoIterator<Item = &'g Gradebook>,
        assignments: Vec<Assignment>,
    ) -> Self {
        let others: Vec<&'g Gradebook> = others.into_iter().collect();
        let merged = MergedGradebook::merge(reference, &others);
        info!(
            students = merged.len(),
            gradebooks = others.len() + 1,
            assignments = assignments.len(),
            "Course assembled"
        );
        Self {
            reference,
            others,
            assignments,
            merged,
        }
    }

    /// Gradebooks in join order, reference first.
    pub fn gradebooks(&self) -> impl Iterator<Item = &'g Gradebook> + '_ {
        std::iter::once(self.reference).chain(self.others.iter().copied())
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Identity of every enrolled student.
    pub fn roster(&self) -> &[Identity] {
        self.merged.roster()
    }

    pub fn gradebook(&self) -> &MergedGradebook {
        &self.merged
    }

    /// Computes a fresh grade table.
    ///
    /// Columns follow identity, tests, averages, final, letter, missed, then
    /// `include_others`, restricted to the selected sections.
    #[tracing::instrument(skip_all, fields(include = ?options.include))]
    pub fn compute_grades(&self, options: &GradeOptions) -> GradeResult<GradeTable> {
        let needs_final = options.includes(Section::Final) || options.includes(Section::Letter);
        let needs_averages = needs_final || options.includes(Section::Averages);

        // One score column per test, grouped by assignment.
        let collapsed: Vec<Vec<Vec<Option<f64>>>> = self
            .assignments
            .iter()
            .map(|a| a.collapse(&self.merged))
            .collect::<GradeResult<_>>()?;

        let mut columns = self.output_columns(options);

        let others: Vec<(String, usize)> = options
            .include_others
            .iter()
            .filter(|c| {
                let taken = IDENTITY_HEADERS.contains(&c.as_str()) || columns.contains(*c);
                if taken {
                    warn!(
                        column = %c,
                        "Passthrough column collides with a generated column, skipping"
                    );
                }
                !taken
            })
            .map(|c| {
                self.merged
                    .column_index(c)
                    .map(|i| (c.clone(), i))
                    .ok_or_else(|| GradeError::MissingColumn {
                        column: c.clone(),
                        context: "the merged gradebook".to_string(),
                    })
            })
            .collect::<GradeResult<_>>()?;

        columns.extend(others.iter().map(|(c, _)| c.clone()));

        let mut rows = Vec::with_capacity(self.merged.len());
        for (row, identity) in self.merged.roster().iter().enumerate() {
            let scores: Vec<Vec<Option<f64>>> = collapsed
                .iter()
                .map(|tests| tests.iter().map(|column| column[row]).collect())
                .collect();

            let missed: Vec<usize> = scores
                .iter()
                .map(|tests| tests.iter().filter(|s| s.is_none()).count())
                .collect();

            let averages: Vec<AssignmentAverage> = if needs_averages {
                self.assignments
                    .iter()
                    .zip(&scores)
                    .map(|(a, s)| a.average(s))
                    .collect::<GradeResult<_>>()?
            } else {
                Vec::new()
            };

            let final_grade = if needs_final {
                self.final_grade(options, &averages)?
            } else {
                None
            };

            let mut cells = Vec::with_capacity(columns.len());
            if options.includes(Section::Tests) {
                cells.extend(scores.iter().flatten().map(|&s| Cell::Score(s)));
            }
            if options.includes(Section::Averages) {
                cells.extend(
                    self.assignments
                        .iter()
                        .zip(&averages)
                        .map(|(a, avg)| Cell::Score(avg.fraction.map(|f| f * a.scaling()))),
                );
            }
            if options.includes(Section::Final) {
                cells.push(Cell::Score(final_grade));
            }
            if options.includes(Section::Letter) {
                cells.push(Cell::Text(
                    final_grade.map(|f| options.scale.letter(f).to_string()),
                ));
            }
            if options.includes(Section::Missed) {
                cells.extend(missed.iter().map(|&m| Cell::Count(m)));
            }
            cells.extend(
                others
                    .iter()
                    .map(|(_, col)| Cell::Text(self.merged.cell(row, *col).map(str::to_string))),
            );

            rows.push(GradeRow {
                identity: identity.clone(),
                cells,
            });
        }

        debug!(rows = rows.len(), columns = columns.len(), "Grades computed");
        Ok(GradeTable::new(columns, rows))
    }

    /// Final percentage from one student's assignment averages.
    fn final_grade(
        &self,
        options: &GradeOptions,
        averages: &[AssignmentAverage],
    ) -> GradeResult<Option<f64>> {
        let items: Vec<GradedItem> = self
            .assignments
            .iter()
            .zip(averages)
            .map(|(a, avg)| GradedItem::new(a.name(), options.missing.apply(avg.fraction), 1.0))
            .collect();

        if items.iter().all(|i| i.score.is_none()) && !items.is_empty() {
            return Ok(None);
        }
        Ok(Some(options.scheme.apply(&items)? * 100.0))
    }

    /// Generated columns for the selected sections, without passthroughs.
    fn output_columns(&self, options: &GradeOptions) -> Vec<String> {
        let mut columns = Vec::new();
        if options.includes(Section::Tests) {
            columns.extend(
                self.assignments
                    .iter()
                    .flat_map(|a| a.tests().iter().map(|t| t.name().to_string())),
            );
        }
        if options.includes(Section::Averages) {
            columns.extend(self.assignments.iter().map(|a| a.name().to_string()));
        }
        if options.includes(Section::Final) {
            columns.push(FINAL_GRADE.to_string());
        }
        if options.includes(Section::Letter) {
            columns.push(LETTER_GRADE.to_string());
        }
        if options.includes(Section::Missed) {
            columns.extend(
                self.assignments
                    .iter()
                    .map(|a| format!("{}{}", a.name(), MISSED_SUFFIX)),
            );
        }
        columns
    }
}
