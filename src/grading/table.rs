//! Output grade table and class summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::loader::RawTable;
use crate::roster::format::IDENTITY_HEADERS;
use crate::roster::{Identity, StudentKey};

pub const FINAL_GRADE: &str = "Final grade";
pub const LETTER_GRADE: &str = "Letter grade";
pub const MISSED_SUFFIX: &str = " missed";

/// Optional column groups of the output, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Tests,
    Averages,
    Final,
    Letter,
    Missed,
}

impl Section {
    /// Everything but the individual tests.
    pub fn defaults() -> Vec<Section> {
        vec![
            Section::Averages,
            Section::Final,
            Section::Letter,
            Section::Missed,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Score(Option<f64>),
    Count(usize),
    Text(Option<String>),
}

impl Cell {
    pub fn as_score(&self) -> Option<f64> {
        match self {
            Cell::Score(s) => *s,
            Cell::Count(c) => Some(*c as f64),
            Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(t) => t.as_deref(),
            _ => None,
        }
    }
}

/// Scores print at full precision, so a score read back from CSV is the same
/// value its letter was derived from. Missing cells print empty.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Score(Some(s)) => write!(f, "{s}"),
            Cell::Score(None) | Cell::Text(None) => Ok(()),
            Cell::Count(c) => write!(f, "{c}"),
            Cell::Text(Some(t)) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    pub identity: Identity,
    /// Aligned with [`GradeTable::columns`].
    pub cells: Vec<Cell>,
}

/// One row per enrolled student: identity columns plus the selected sections.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeTable {
    columns: Vec<String>,
    rows: Vec<GradeRow>,
}

impl GradeTable {
    pub fn new(columns: Vec<String>, rows: Vec<GradeRow>) -> Self {
        Self { columns, rows }
    }

    /// Non-identity column headers.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Full header row, identity columns first.
    pub fn headers(&self) -> Vec<String> {
        IDENTITY_HEADERS
            .iter()
            .map(|h| h.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn rows(&self) -> &[GradeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Every cell of `column`, in row order.
    pub fn column(&self, column: &str) -> Option<Vec<&Cell>> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r.cells[col]).collect())
    }

    pub fn row(&self, key: &StudentKey) -> Option<&GradeRow> {
        self.rows.iter().find(|r| &r.identity.key == key)
    }

    pub fn value(&self, key: &StudentKey, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        Some(&self.row(key)?.cells[col])
    }

    /// Renders every cell as text, identity columns first.
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let identity = &row.identity;
                [
                    identity.last.clone(),
                    identity.first.clone(),
                    identity.key.to_string(),
                    identity.email.clone().unwrap_or_default(),
                ]
                .into_iter()
                .chain(row.cells.iter().map(Cell::to_string))
                .collect()
            })
            .collect();
        RawTable::new(self.headers(), rows)
    }

    /// Class-level statistics over the final grade and letter columns, when present.
    pub fn summary(&self) -> CourseSummary {
        let finals: Vec<f64> = self
            .column(FINAL_GRADE)
            .map(|cells| cells.iter().filter_map(|c| c.as_score()).collect())
            .unwrap_or_default();

        let mut letter_counts = BTreeMap::new();
        if let Some(letters) = self.column(LETTER_GRADE) {
            for letter in letters.iter().filter_map(|c| c.as_text()) {
                *letter_counts.entry(letter.to_string()).or_insert(0) += 1;
            }
        }

        let (mean_final, stddev_final) = if finals.is_empty() {
            (None, None)
        } else {
            let mean = finals.iter().sum::<f64>() / finals.len() as f64;
            let variance =
                finals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / finals.len() as f64;
            (Some(mean), Some(variance.sqrt()))
        };

        CourseSummary {
            generated_at: Utc::now(),
            students: self.rows.len(),
            mean_final,
            stddev_final,
            letter_counts,
        }
    }
}

/// Distribution of final grades, logged as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub generated_at: DateTime<Utc>,
    pub students: usize,
    pub mean_final: Option<f64>,
    /// Population standard deviation.
    pub stddev_final: Option<f64>,
    pub letter_counts: BTreeMap<String, usize>,
}
