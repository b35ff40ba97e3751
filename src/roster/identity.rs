//! Student identity resolution.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::error::{GradeError, GradeResult};
use crate::roster::format::{NameColumns, NameOrder};

/// Join key for every row of every gradebook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentKey(String);

impl StudentKey {
    /// Returns `None` for blank input; a key is never empty.
    pub fn new(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// Local part of an email address, if there is one.
    pub fn from_email(email: &str) -> Option<Self> {
        let local = email.trim().split('@').next()?;
        Self::new(local)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved identity columns of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub key: StudentKey,
    pub last: String,
    pub first: String,
    pub email: Option<String>,
}

/// Identity cells of one raw row, already stripped of missing markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCells<'a> {
    pub last: Option<&'a str>,
    pub first: Option<&'a str>,
    pub full: Option<&'a str>,
    pub id: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Derives the student key and name fields for one row.
///
/// Key precedence is explicit ID, then the email local part. A full-name cell
/// that cannot be split is tolerated when the row is keyed (the whole cell
/// becomes the last name), and rejected with [`GradeError::NameSplit`] when
/// it is not. A row with no key and no name at all is a
/// [`GradeError::MissingIdentity`].
pub fn resolve_identity(
    source_name: &str,
    row: usize,
    names: &NameColumns,
    cells: IdentityCells<'_>,
) -> GradeResult<Identity> {
    let key = cells
        .id
        .and_then(StudentKey::new)
        .or_else(|| cells.email.and_then(StudentKey::from_email));

    let (last, first) = match names {
        NameColumns::Split { .. } => (
            cells.last.unwrap_or_default().to_string(),
            cells.first.unwrap_or_default().to_string(),
        ),
        NameColumns::Full {
            order, separator, ..
        } => {
            let full = cells.full.unwrap_or_default();
            match separator.split(full) {
                Some((head, tail)) => {
                    if separator.split(tail).is_some() {
                        warn!(
                            source = source_name,
                            row,
                            name = full,
                            "Full name has more than two parts, split may be incorrect"
                        );
                    }
                    match order {
                        NameOrder::FirstLast => (tail.to_string(), head.to_string()),
                        NameOrder::LastFirst => (head.to_string(), tail.to_string()),
                    }
                }
                None if key.is_some() => {
                    warn!(source = source_name, row, name = full, "Full name could not be split");
                    (full.trim().to_string(), String::new())
                }
                None if full.trim().is_empty() => {
                    return Err(GradeError::MissingIdentity {
                        source_name: source_name.to_string(),
                        row,
                    });
                }
                None => {
                    return Err(GradeError::NameSplit {
                        source_name: source_name.to_string(),
                        row,
                        name: full.to_string(),
                    });
                }
            }
        }
    };

    let key = key.ok_or_else(|| GradeError::MissingIdentity {
        source_name: source_name.to_string(),
        row,
    })?;

    Ok(Identity {
        key,
        last,
        first,
        email: cells.email.map(str::to_string),
    })
}
