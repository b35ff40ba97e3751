//! Normalized gradebooks keyed by student.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{GradeError, GradeResult};
use crate::loader::{RawTable, load_table};
use crate::roster::format::{FileType, HeaderMapping, NameColumns};
use crate::roster::identity::{Identity, IdentityCells, StudentKey, resolve_identity};

/// One row of a gradebook: resolved identity plus the remaining cells.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub identity: Identity,
    /// Aligned with [`Gradebook::columns`]; `None` is a missing cell.
    pub values: Vec<Option<String>>,
}

/// One export, normalized to identity columns plus pass-through data columns.
///
/// Immutable once built. Row order follows the source file.
#[derive(Debug, Clone)]
pub struct Gradebook {
    name: String,
    columns: Vec<String>,
    records: Vec<StudentRecord>,
    index: HashMap<StudentKey, usize>,
}

impl Gradebook {
    /// Normalizes a raw table. The whole table is rejected if any row cannot
    /// be keyed or two rows share a key.
    #[tracing::instrument(skip(table, mapping), fields(rows = table.rows.len()))]
    pub fn from_table(name: &str, table: &RawTable, mapping: &HeaderMapping) -> GradeResult<Self> {
        let require = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| GradeError::MissingColumn {
                    column: column.to_string(),
                    context: format!("gradebook `{name}`"),
                })
        };

        let (last_col, first_col, full_col) = match &mapping.names {
            NameColumns::Split { last, first } => (
                Some(require(last.as_str())?),
                Some(require(first.as_str())?),
                None,
            ),
            NameColumns::Full { column, .. } => (None, None, Some(require(column.as_str())?)),
        };
        let id_col = mapping.id.as_deref().map(require).transpose()?;
        let email_col = mapping.email.as_deref().map(require).transpose()?;

        let identity_columns = mapping.identity_columns();
        let data_columns: Vec<(usize, String)> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !identity_columns.contains(&h.as_str()))
            .map(|(i, h)| (i, h.clone()))
            .collect();

        let mut records = Vec::with_capacity(table.rows.len());
        let mut index = HashMap::with_capacity(table.rows.len());

        for row in 0..table.rows.len() {
            let cell = |col: Option<usize>| {
                col.map(|c| table.cell(row, c))
                    .filter(|v| !mapping.is_missing(v))
            };

            let identity = resolve_identity(
                name,
                row,
                &mapping.names,
                IdentityCells {
                    last: cell(last_col),
                    first: cell(first_col),
                    full: cell(full_col),
                    id: cell(id_col),
                    email: cell(email_col),
                },
            )?;

            if index.insert(identity.key.clone(), records.len()).is_some() {
                return Err(GradeError::DuplicateKey {
                    source_name: name.to_string(),
                    key: identity.key.to_string(),
                });
            }

            let values = data_columns
                .iter()
                .map(|(c, _)| cell(Some(*c)).map(str::to_string))
                .collect();

            records.push(StudentRecord { identity, values });
        }

        debug!(students = records.len(), columns = data_columns.len(), "Gradebook normalized");

        Ok(Self {
            name: name.to_string(),
            columns: data_columns.into_iter().map(|(_, h)| h).collect(),
            records,
            index,
        })
    }

    /// Normalizes a raw table with a named preset (`"GS"`, `"WA"`).
    pub fn from_preset(name: &str, table: &RawTable, file_type: &str) -> GradeResult<Self> {
        let file_type: FileType = file_type.parse()?;
        Self::from_table(name, table, &file_type.mapping())
    }

    /// Loads and normalizes a CSV export. The gradebook is named after the file stem.
    pub fn load(path: impl AsRef<Path>, mapping: &HeaderMapping) -> Result<Self> {
        let path = path.as_ref();
        let table = load_table(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("gradebook");
        let gradebook = Self::from_table(name, &table, mapping)?;
        info!(gradebook = name, students = gradebook.len(), "Gradebook loaded");
        Ok(gradebook)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-identity column headers, in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &StudentKey) -> Option<&StudentRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn contains(&self, key: &StudentKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell for `key` in `column`, `None` when missing or absent.
    pub fn value(&self, key: &StudentKey, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.get(key)?.values[col].as_deref()
    }
}
