//! Output formatting and persistence for grade tables.
//!
//! Supports pretty-printing, JSON summaries, and CSV export.

use anyhow::Result;
use csv::WriterBuilder;
use std::path::Path;
use tracing::{debug, info};

use crate::grading::{CourseSummary, GradeTable};
use crate::loader::RawTable;

/// Logs a grade table using Rust's debug pretty-print format.
pub fn print_pretty(table: &GradeTable) {
    debug!("{:#?}", table);
}

/// Logs a class summary as pretty-printed JSON.
pub fn print_json(summary: &CourseSummary) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Writes a grade table to a CSV file, replacing any existing file.
pub fn write_table(path: impl AsRef<Path>, table: &GradeTable) -> Result<()> {
    write_raw(path, &table.to_raw())
}

/// Writes a header row and string cells to a CSV file.
pub fn write_raw(path: impl AsRef<Path>, table: &RawTable) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = table.rows.len(), "Writing CSV");

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::{Cell, GradeRow, table::FINAL_GRADE};
    use crate::loader::load_table;
    use crate::roster::{Identity, StudentKey};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn table() -> GradeTable {
        GradeTable::new(
            vec![FINAL_GRADE.to_string(), "Comments".to_string()],
            vec![GradeRow {
                identity: Identity {
                    key: StudentKey::new("ada").unwrap(),
                    last: "Lovelace".into(),
                    first: "Ada".into(),
                    email: Some("ada@uni.edu".into()),
                },
                cells: vec![
                    Cell::Score(Some(91.256)),
                    Cell::Text(Some("late, but fine".into())),
                ],
            }],
        )
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&table());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&table().summary()).unwrap();
    }

    #[test]
    fn test_write_table_round_trips_through_loader() {
        let path = temp_path("roster_grader_test_write.csv");
        let _ = fs::remove_file(&path);

        write_table(&path, &table()).unwrap();
        let loaded = load_table(&path).unwrap();

        assert_eq!(
            loaded.headers,
            vec!["Last Name", "First Name", "ID", "Email", "Final grade", "Comments"]
        );
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[0][4], "91.256");
        assert_eq!(loaded.rows[0][5], "late, but fine");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_table_overwrites() {
        let path = temp_path("roster_grader_test_overwrite.csv");
        write_table(&path, &table()).unwrap();
        write_table(&path, &table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }
}
