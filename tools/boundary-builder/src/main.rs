//! Boundary-detection label builder
//!
//! Cuts every annotated report at its labelled boundary points and writes
//! one normalized segment per row, tagged with its section label and the
//! report's hospital id.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use annoprep_core::boundary::REPORT_COLUMN;
use annoprep_core::{ReportIndex, TextNormalizer, build_segments, load_examples, write_csv_file};

#[derive(Parser, Debug)]
#[command(name = "annoprep-boundary")]
#[command(about = "Build boundary-detection segments from a Label Studio export")]
#[command(version)]
struct Cli {
    /// Label Studio JSON export
    #[arg(long = "input_file")]
    input_file: PathBuf,

    /// CSV table with REPORT and HOSP_ID columns
    #[arg(long = "report_file")]
    report_file: PathBuf,

    /// Output CSV (Text, Tag, Hosp_id)
    #[arg(long = "output_file")]
    output_file: PathBuf,

    /// Data field holding the report text
    #[arg(long = "field_name", default_value = REPORT_COLUMN)]
    field_name: String,
}

fn run(cli: &Cli) -> Result<usize> {
    let reports = File::open(&cli.report_file)
        .with_context(|| format!("failed to open {}", cli.report_file.display()))?;
    let index = ReportIndex::from_csv(reports)
        .with_context(|| format!("failed to read report table {}", cli.report_file.display()))?;

    let examples = load_examples(&cli.input_file)
        .with_context(|| format!("failed to read {}", cli.input_file.display()))?;

    let normalizer = TextNormalizer::new()?;
    let segments = build_segments(&examples, &cli.field_name, &index, &normalizer)?;

    write_csv_file(&cli.output_file, &segments)
        .with_context(|| format!("failed to write {}", cli.output_file.display()))?;
    Ok(segments.len())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let rows = run(&cli)?;
    info!(rows, output = %cli.output_file.display(), "segments written");
    Ok(())
}
