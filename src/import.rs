//! Re-projection of a grade table into an LMS gradebook-import file.
//!
//! The import layout identifies students by `#`-prefixed username, carries
//! extra grade items as `"{column} Points Grade"`, and stores the final grade
//! as a numerator over 100.

use tracing::info;

use crate::error::{GradeError, GradeResult};
use crate::grading::LetterScale;
use crate::grading::table::LETTER_GRADE;
use crate::loader::RawTable;
use crate::roster::format::{EMAIL, FIRST_NAME, ID, LAST_NAME};

const USERNAME: &str = "Username";
const POINTS_GRADE_SUFFIX: &str = " Points Grade";
const FINAL_NUMERATOR: &str = "Adjusted Final Grade Numerator";
const FINAL_DENOMINATOR: &str = "Adjusted Final Grade Denominator";
const END_OF_LINE: &str = "End-Of-Line Indicator";

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Column holding the letter to import, e.g. a hand-adjusted copy.
    pub letter_column: String,
    /// Convert letters back to the midpoint of their band; otherwise copy
    /// the letter column as is.
    pub standardize: bool,
    pub scale: LetterScale,
    /// Extra columns imported as points grades.
    pub include_others: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            letter_column: LETTER_GRADE.to_string(),
            standardize: true,
            scale: LetterScale::default(),
            include_others: Vec::new(),
        }
    }
}

/// Builds the import table from a grade table read back from CSV.
///
/// # Errors
///
/// - [`GradeError::MissingColumn`] if an identity, letter, or extra column is absent.
/// - [`GradeError::UnknownLetter`] if a letter is not on the scale while standardizing.
#[tracing::instrument(skip_all, fields(rows = grades.rows.len(), letter_column = %options.letter_column))]
pub fn create_import(grades: &RawTable, options: &ImportOptions) -> GradeResult<RawTable> {
    let require = |column: &str| {
        grades
            .column_index(column)
            .ok_or_else(|| GradeError::MissingColumn {
                column: column.to_string(),
                context: "the grade table".to_string(),
            })
    };

    let id = require(ID)?;
    let identity = [require(LAST_NAME)?, require(FIRST_NAME)?, require(EMAIL)?];
    let letter = require(options.letter_column.as_str())?;
    let others = options
        .include_others
        .iter()
        .map(|c| require(c.as_str()))
        .collect::<GradeResult<Vec<_>>>()?;

    let headers: Vec<String> = [USERNAME, LAST_NAME, FIRST_NAME, EMAIL]
        .into_iter()
        .map(str::to_string)
        .chain(
            options
                .include_others
                .iter()
                .map(|c| format!("{c}{POINTS_GRADE_SUFFIX}")),
        )
        .chain(
            [FINAL_NUMERATOR, FINAL_DENOMINATOR, END_OF_LINE]
                .into_iter()
                .map(str::to_string),
        )
        .collect();

    let rows = (0..grades.rows.len())
        .map(|row| {
            let numerator = if options.standardize {
                options
                    .scale
                    .midpoint(grades.cell(row, letter))?
                    .to_string()
            } else {
                grades.cell(row, letter).to_string()
            };

            let mut out = vec![format!("#{}", grades.cell(row, id))];
            out.extend(identity.iter().map(|&c| grades.cell(row, c).to_string()));
            out.extend(others.iter().map(|&c| grades.cell(row, c).to_string()));
            out.extend([numerator, "100".to_string(), "#".to_string()]);
            Ok(out)
        })
        .collect::<GradeResult<Vec<_>>>()?;

    info!(rows = rows.len(), "Import table built");
    Ok(RawTable::new(headers, rows))
}
