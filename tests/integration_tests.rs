use roster_grader::GradeError;
use roster_grader::config::CourseConfig;
use roster_grader::grading::{
    Assignment, Cell, Course, GradeOptions, GradeTable, GradingScheme, LetterScale, PerTest,
    Section,
};
use roster_grader::import::{ImportOptions, create_import};
use roster_grader::loader::{load_table, read_table};
use roster_grader::output::write_table;
use roster_grader::roster::{Gradebook, StudentKey};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn key(k: &str) -> StudentKey {
    StudentKey::new(k).unwrap()
}

fn score(table: &GradeTable, student: &str, column: &str) -> f64 {
    table
        .value(&key(student), column)
        .and_then(Cell::as_score)
        .unwrap_or_else(|| panic!("no score for {student} in {column}"))
}

fn letter<'a>(table: &'a GradeTable, student: &str) -> Option<&'a str> {
    table
        .value(&key(student), "Letter grade")
        .and_then(Cell::as_text)
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

fn compute_from_fixtures() -> GradeTable {
    let config = CourseConfig::load(fixture("course.json")).expect("Failed to load config");
    let gradebooks = config.load_gradebooks().expect("Failed to load gradebooks");
    let course = Course::new(
        &gradebooks[0],
        &gradebooks[1..],
        config.build_assignments().unwrap(),
    );
    course
        .compute_grades(&config.grade_options().unwrap())
        .unwrap()
}

#[test]
fn test_full_pipeline() {
    let table = compute_from_fixtures();

    // The WebAssign-only student is not enrolled.
    assert_eq!(table.len(), 3);
    assert!(table.row(&key("dan")).is_none());

    assert_eq!(
        table.headers(),
        vec![
            "Last Name",
            "First Name",
            "ID",
            "Email",
            "WebAssign",
            "Quiz",
            "HW",
            "Midterm",
            "Final grade",
            "Letter grade",
            "WebAssign missed",
            "Quiz missed",
            "HW missed",
            "Midterm missed",
            "Comments",
        ]
    );

    assert_close(score(&table, "ada", "WebAssign"), 4.5);
    assert_close(score(&table, "ada", "Quiz"), 19.0);
    assert_close(score(&table, "ada", "HW"), 19.0);
    assert_close(score(&table, "ada", "Final grade"), 94.5);
    assert_eq!(letter(&table, "ada"), Some("A"));

    assert_close(score(&table, "aturing", "Final grade"), 63.75);
    assert_eq!(letter(&table, "aturing"), Some("D"));
    assert_close(score(&table, "aturing", "WebAssign missed"), 1.0);
    assert_close(score(&table, "aturing", "HW missed"), 1.0);
    assert_close(score(&table, "aturing", "Quiz missed"), 0.0);

    assert_close(score(&table, "ghopper", "Final grade"), 79.9);
    assert_eq!(letter(&table, "ghopper"), Some("C+"));
    assert_close(score(&table, "ghopper", "Quiz missed"), 1.0);

    let row = table.row(&key("ghopper")).unwrap();
    assert_eq!(row.identity.first, "Grace");
    assert_eq!(row.identity.last, "Hopper");
    assert_eq!(
        table.value(&key("ghopper"), "Comments").and_then(Cell::as_text),
        Some("late HW")
    );
}

#[test]
fn test_letters_rederived_from_final_column() {
    let config = CourseConfig::load(fixture("course.json")).unwrap();
    let gradebooks = config.load_gradebooks().unwrap();
    let course = Course::new(
        &gradebooks[0],
        &gradebooks[1..],
        config.build_assignments().unwrap(),
    );

    let thresholds = vec![90.0, 80.0, 70.0, 0.0];
    let letters = vec!["A", "B", "C", "F"];
    let options = config
        .grade_options()
        .unwrap()
        .with_letters(thresholds.clone(), letters.clone())
        .unwrap()
        .with_include([Section::Final, Section::Letter])
        .with_others(Vec::<String>::new());
    let table = course.compute_grades(&options).unwrap();

    assert_eq!(table.columns(), &["Final grade", "Letter grade"]);

    let scale = LetterScale::new(thresholds, letters).unwrap();
    let finals = table.column("Final grade").unwrap();
    let letters = table.column("Letter grade").unwrap();
    for (f, l) in finals.iter().zip(letters) {
        assert_eq!(Some(scale.letter(f.as_score().unwrap())), l.as_text());
    }
}

#[test]
fn test_written_table_feeds_import() {
    let table = compute_from_fixtures();
    let path = std::env::temp_dir().join("roster_grader_integration_grades.csv");
    write_table(&path, &table).unwrap();

    let reloaded = load_table(&path).unwrap();
    let import = create_import(&reloaded, &ImportOptions::default()).unwrap();

    assert_eq!(import.rows.len(), 3);
    assert_eq!(import.rows[0][0], "#ada");
    // A -> 96, D -> 57, C+ -> 77
    let numerators: Vec<&str> = import.rows.iter().map(|r| r[4].as_str()).collect();
    assert_eq!(numerators, vec!["96", "57", "77"]);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_ambiguous_version_aborts_compute() {
    let table = read_table(
        "Name,SID,Email,Quiz 1 - v1,Quiz 1 - v2\n\
         Ada Lovelace,ada,,10,\n\
         Alan Turing,aturing,,9,8\n"
            .as_bytes(),
    )
    .unwrap();
    let gradebook = Gradebook::from_preset("gs", &table, "GS").unwrap();
    let quiz = Assignment::templated(
        "Quiz",
        Some(1),
        PerTest::Uniform(10.0),
        PerTest::Uniform(2),
    )
    .unwrap();
    let course = Course::new(&gradebook, Vec::<&Gradebook>::new(), vec![quiz]);

    let err = course.compute_grades(&GradeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        GradeError::AmbiguousVersion { ref student, .. } if student == "aturing"
    ));
}

#[test]
fn test_unkeyed_gradebook_is_rejected() {
    let table = read_table("Name,SID,Email\nAda Lovelace,,\n".as_bytes()).unwrap();
    assert!(matches!(
        Gradebook::from_preset("gs", &table, "GS"),
        Err(GradeError::MissingIdentity { .. })
    ));
}

#[test]
fn test_custom_course_scheme() {
    let config = CourseConfig::load(fixture("course.json")).unwrap();
    let gradebooks = config.load_gradebooks().unwrap();
    let course = Course::new(
        &gradebooks[0],
        &gradebooks[1..],
        config.build_assignments().unwrap(),
    );

    // Midterm only.
    let midterm_only = GradingScheme::custom(|items| {
        items
            .iter()
            .find(|i| i.label == "Midterm")
            .and_then(|i| i.fraction())
            .unwrap_or(0.0)
    });
    let options = GradeOptions::default()
        .with_scheme(midterm_only)
        .with_include([Section::Final]);
    let table = course.compute_grades(&options).unwrap();

    assert_close(score(&table, "aturing", "Final grade"), 70.0);
    assert_close(score(&table, "ghopper", "Final grade"), 88.0);
}

#[test]
fn test_written_final_rederives_same_letter_at_boundary() {
    let table = read_table("Name,SID,Email,Exam\nAda Lovelace,ada,,92.996\n".as_bytes()).unwrap();
    let gradebook = Gradebook::from_preset("gs", &table, "GS").unwrap();
    let course = Course::new(
        &gradebook,
        Vec::<&Gradebook>::new(),
        vec![Assignment::single("Exam", 100.0).unwrap()],
    );
    let options = GradeOptions::default().with_include([Section::Final, Section::Letter]);
    let grades = course.compute_grades(&options).unwrap();
    assert_eq!(letter(&grades, "ada"), Some("A-"));

    let path = std::env::temp_dir().join("roster_grader_integration_boundary.csv");
    write_table(&path, &grades).unwrap();
    let reloaded = load_table(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let final_col = reloaded.column_index("Final grade").unwrap();
    let letter_col = reloaded.column_index("Letter grade").unwrap();
    let written: f64 = reloaded.cell(0, final_col).parse().unwrap();
    assert_eq!(
        LetterScale::default().letter(written),
        reloaded.cell(0, letter_col)
    );
}

#[test]
fn test_blank_identity_row_reports_missing_identity() {
    let table = read_table("Name,SID,Email\nAda Lovelace,ada,\n,,\n".as_bytes()).unwrap();
    assert!(matches!(
        Gradebook::from_preset("gs", &table, "GS"),
        Err(GradeError::MissingIdentity { row: 1, .. })
    ));
}
