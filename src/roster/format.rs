//! Header-to-role mappings and the known export presets.

use serde::Deserialize;
use std::str::FromStr;

use crate::error::GradeError;

/// Canonical headers for the identity columns of every normalized table.
pub const LAST_NAME: &str = "Last Name";
pub const FIRST_NAME: &str = "First Name";
pub const ID: &str = "ID";
pub const EMAIL: &str = "Email";

pub const IDENTITY_HEADERS: [&str; 4] = [LAST_NAME, FIRST_NAME, ID, EMAIL];

/// Order of the two halves of a full-name cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrder {
    #[default]
    FirstLast,
    LastFirst,
}

/// How a full-name cell is split in two.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSeparator {
    /// Split on the first run of whitespace.
    #[default]
    Whitespace,
    /// Split on the first occurrence of a literal string, e.g. `", "`.
    Literal(String),
}

impl NameSeparator {
    /// Splits `name` into two trimmed halves, or `None` when the separator is absent.
    pub fn split<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        let name = name.trim();
        let (head, tail) = match self {
            NameSeparator::Whitespace => name.split_once(char::is_whitespace)?,
            NameSeparator::Literal(sep) => name.split_once(sep.as_str())?,
        };
        let (head, tail) = (head.trim(), tail.trim());
        if head.is_empty() || tail.is_empty() {
            return None;
        }
        Some((head, tail))
    }
}

/// Where the student's name lives in a raw export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameColumns {
    Split {
        last: String,
        first: String,
    },
    Full {
        column: String,
        #[serde(default)]
        order: NameOrder,
        #[serde(default)]
        separator: NameSeparator,
    },
}

/// Maps the recognised identity roles onto the headers of one raw export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeaderMapping {
    pub names: NameColumns,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Cell values that mean "no score", in addition to empty cells.
    #[serde(default)]
    pub missing_values: Vec<String>,
}

impl HeaderMapping {
    pub fn split_names(last: &str, first: &str) -> Self {
        Self {
            names: NameColumns::Split {
                last: last.to_string(),
                first: first.to_string(),
            },
            id: None,
            email: None,
            missing_values: Vec::new(),
        }
    }

    pub fn full_name(column: &str, order: NameOrder, separator: NameSeparator) -> Self {
        Self {
            names: NameColumns::Full {
                column: column.to_string(),
                order,
                separator,
            },
            id: None,
            email: None,
            missing_values: Vec::new(),
        }
    }

    pub fn with_id(mut self, column: &str) -> Self {
        self.id = Some(column.to_string());
        self
    }

    pub fn with_email(mut self, column: &str) -> Self {
        self.email = Some(column.to_string());
        self
    }

    pub fn with_missing_values(mut self, values: &[&str]) -> Self {
        self.missing_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Raw headers consumed as identity, so they are not carried as data columns.
    pub fn identity_columns(&self) -> Vec<&str> {
        let mut cols = match &self.names {
            NameColumns::Split { last, first } => vec![last.as_str(), first.as_str()],
            NameColumns::Full { column, .. } => vec![column.as_str()],
        };
        cols.extend(self.id.as_deref());
        cols.extend(self.email.as_deref());
        cols
    }

    pub fn is_missing(&self, cell: &str) -> bool {
        let cell = cell.trim();
        cell.is_empty() || self.missing_values.iter().any(|m| m == cell)
    }
}

/// Named export presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Gradescope: `Name` (first last), `SID`, `Email`.
    Gradescope,
    /// WebAssign: `Fullname` (last, first), `Email`; `ND`/`NS` mean no score.
    WebAssign,
}

impl FileType {
    pub fn mapping(self) -> HeaderMapping {
        match self {
            FileType::Gradescope => {
                HeaderMapping::full_name("Name", NameOrder::FirstLast, NameSeparator::Whitespace)
                    .with_id("SID")
                    .with_email("Email")
            }
            FileType::WebAssign => HeaderMapping::full_name(
                "Fullname",
                NameOrder::LastFirst,
                NameSeparator::Literal(", ".to_string()),
            )
            .with_email("Email")
            .with_missing_values(&["ND", "NS"]),
        }
    }
}

impl FromStr for FileType {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GS" | "GRADESCOPE" => Ok(FileType::Gradescope),
            "WA" | "WEBASSIGN" => Ok(FileType::WebAssign),
            _ => Err(GradeError::UnknownFormat(s.to_string())),
        }
    }
}
