//! CLI entry point for the roster grader.
//!
//! Provides subcommands for computing a course grade table from gradebook
//! exports and for turning that table into an LMS import file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use roster_grader::config::CourseConfig;
use roster_grader::grading::Course;
use roster_grader::import::{ImportOptions, create_import};
use roster_grader::loader::load_table;
use roster_grader::output::{print_json, print_pretty, write_raw, write_table};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "roster_grader")]
#[command(about = "Merge gradebook exports and compute course grades", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the grade table described by a course config
    Grade {
        /// JSON course definition
        #[arg(short, long, value_name = "FILE")]
        config: String,

        /// CSV file to write the grade table to
        #[arg(short, long, default_value = "grades.csv")]
        output: String,

        /// Log a JSON summary of the final grades
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Build an LMS import file from a grade table
    Import {
        /// Grade table CSV, as written by `grade`
        #[arg(short, long)]
        input: String,

        /// CSV file to write the import table to
        #[arg(short, long, default_value = "import.csv")]
        output: String,

        /// Column holding the letter grade to import
        #[arg(short, long, default_value = "Letter grade")]
        letter_column: String,

        /// Copy the letter column instead of converting letters to points
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Extra columns to import as points grades
        #[arg(long = "include")]
        include_others: Vec<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/roster_grader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("roster_grader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            config,
            output,
            summary,
        } => grade(&config, &output, summary)?,
        Commands::Import {
            input,
            output,
            letter_column,
            raw,
            include_others,
        } => {
            let grades = load_table(&input)?;
            let options = ImportOptions {
                letter_column,
                standardize: !raw,
                include_others,
                ..Default::default()
            };
            let import = create_import(&grades, &options)?;
            write_raw(&output, &import)?;
            info!(output = %output, rows = import.rows.len(), "Import file written");
        }
    }

    Ok(())
}

/// Loads every gradebook named in the config, computes grades, and writes them out.
#[tracing::instrument(skip_all, fields(config = %config_path, output = %output))]
fn grade(config_path: &str, output: &str, summary: bool) -> Result<()> {
    let config = CourseConfig::load(config_path)?;
    let gradebooks = config.load_gradebooks()?;
    let assignments = config.build_assignments()?;
    let options = config.grade_options()?;

    let Some((reference, others)) = gradebooks.split_first() else {
        anyhow::bail!("no gradebooks configured");
    };
    let course = Course::new(reference, others, assignments);
    let table = course.compute_grades(&options)?;

    print_pretty(&table);
    write_table(output, &table)?;
    info!(students = table.len(), columns = table.headers().len(), "Grade table written");

    if summary {
        print_json(&table.summary())?;
    }

    Ok(())
}
