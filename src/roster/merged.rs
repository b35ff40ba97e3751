//! Left-join of several gradebooks onto a reference roster.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::roster::gradebook::Gradebook;
use crate::roster::identity::Identity;

/// All data columns of every gradebook, one row per reference student.
#[derive(Debug, Clone)]
pub struct MergedGradebook {
    roster: Vec<Identity>,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    /// Row-major, aligned with `roster` and `columns`.
    cells: Vec<Vec<Option<String>>>,
}

impl MergedGradebook {
    /// Joins `others` onto `reference` by student key.
    ///
    /// The reference decides who is enrolled: students it lacks are dropped,
    /// and students missing from a later gradebook get empty cells. When two
    /// gradebooks share a column name, the earlier one wins.
    #[tracing::instrument(skip_all, fields(reference = reference.name(), others = others.len()))]
    pub fn merge(reference: &Gradebook, others: &[&Gradebook]) -> Self {
        let roster: Vec<Identity> = reference
            .records()
            .iter()
            .map(|r| r.identity.clone())
            .collect();
        let mut columns: Vec<String> = reference.columns().to_vec();
        let mut cells: Vec<Vec<Option<String>>> =
            reference.records().iter().map(|r| r.values.clone()).collect();

        for other in others {
            let missing: Vec<&str> = roster
                .iter()
                .filter(|s| !other.contains(&s.key))
                .map(|s| s.key.as_str())
                .collect();
            if !missing.is_empty() {
                warn!(
                    gradebook = other.name(),
                    count = missing.len(),
                    students = ?missing,
                    "Students missing grades in gradebook"
                );
            }

            let dropped = other
                .records()
                .iter()
                .filter(|r| !reference.contains(&r.identity.key))
                .count();
            if dropped > 0 {
                debug!(gradebook = other.name(), dropped, "Ignoring students not on the roster");
            }

            let mut taken = Vec::new();
            for (src, column) in other.columns().iter().enumerate() {
                if columns.contains(column) {
                    warn!(
                        gradebook = other.name(),
                        column = %column,
                        "Column already present in an earlier gradebook, keeping the earlier one"
                    );
                    continue;
                }
                columns.push(column.clone());
                taken.push(src);
            }

            for (student, row) in roster.iter().zip(cells.iter_mut()) {
                let record = other.get(&student.key);
                row.extend(
                    taken
                        .iter()
                        .map(|&src| record.and_then(|r| r.values[src].clone())),
                );
            }
        }

        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self {
            roster,
            columns,
            index,
            cells,
        }
    }

    /// Identity of every enrolled student, in reference order.
    pub fn roster(&self) -> &[Identity] {
        &self.roster
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(row)?.get(col)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;
    use crate::roster::identity::StudentKey;

    fn gradebook(name: &str, csv: &str) -> Gradebook {
        let table = read_table(csv.as_bytes()).unwrap();
        Gradebook::from_preset(name, &table, "GS").unwrap()
    }

    #[test]
    fn test_reference_roster_decides_enrollment() {
        let gs = gradebook("gs", "Name,SID,Email,HW 1\nAda Lovelace,1,,10\nAlan Turing,2,,8\n");
        let extra = gradebook(
            "extra",
            "Name,SID,Email,Quiz 1\nAlan Turing,2,,7\nGhost Student,9,,5\nAda Lovelace,1,,6\n",
        );

        let merged = MergedGradebook::merge(&gs, &[&extra]);

        assert_eq!(merged.len(), 2);
        let keys: Vec<&str> = merged.roster().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert!(!merged.roster().iter().any(|s| s.key == StudentKey::new("9").unwrap()));

        let quiz = merged.column_index("Quiz 1").unwrap();
        assert_eq!(merged.cell(0, quiz), Some("6"));
        assert_eq!(merged.cell(1, quiz), Some("7"));
    }

    #[test]
    fn test_student_missing_from_later_gradebook() {
        let gs = gradebook("gs", "Name,SID,Email,HW 1\nAda Lovelace,1,,10\nAlan Turing,2,,8\n");
        let partial = gradebook("partial", "Name,SID,Email,Quiz 1\nAlan Turing,2,,7\n");

        let merged = MergedGradebook::merge(&gs, &[&partial]);
        let quiz = merged.column_index("Quiz 1").unwrap();
        assert_eq!(merged.cell(0, quiz), None);
        assert_eq!(merged.cell(1, quiz), Some("7"));
    }

    #[test]
    fn test_first_column_wins_on_collision() {
        let gs = gradebook("gs", "Name,SID,Email,HW 1\nAda Lovelace,1,,10\n");
        let other = gradebook("other", "Name,SID,Email,HW 1\nAda Lovelace,1,,3\n");

        let merged = MergedGradebook::merge(&gs, &[&other]);
        assert_eq!(merged.columns(), &["HW 1".to_string()]);
        assert_eq!(merged.cell(0, 0), Some("10"));
    }
}
