//! CSV loader for gradebook exports.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A header row plus string cells, exactly as exported by a grading platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of `name` in the header row.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (`row`, `col`), or `""` for short rows.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Loads a CSV file with a header row into a [`RawTable`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid CSV.
pub fn load_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let table = read_table(file).with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "Loaded table"
    );
    Ok(table)
}

/// Reads CSV from any reader. Ragged rows are padded with empty cells.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len().max(row.len()), String::new());
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}
