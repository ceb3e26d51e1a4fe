//! NER dataset builder
//!
//! Reads a Label Studio JSON export and writes
//! `<output_dir>/data/{train,validation,test}.csv`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use annoprep_core::dataset::{DatasetConfig, build_dataset, ensure_absent, write_dataset};
use annoprep_core::load_examples;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "annoprep-dataset")]
#[command(about = "Build NER train/validation/test CSVs from a Label Studio export")]
#[command(version)]
struct Cli {
    /// Label Studio JSON export
    #[arg(long = "input_file")]
    input_file: PathBuf,

    /// Data field holding the annotated text
    #[arg(long = "field_name")]
    field_name: String,

    /// Output directory, must not exist yet
    #[arg(long = "output_dir")]
    output_dir: PathBuf,

    /// Shuffle seed
    #[arg(long, default_value_t = 1314)]
    seed: u64,

    /// Fraction of all rows held out as test
    #[arg(long = "test_size", default_value_t = 0.2)]
    test_size: f64,

    /// Fraction of the rows left after the test cut held out as validation
    #[arg(long = "validation_size", default_value_t = 0.125)]
    validation_size: f64,

    /// Also write token/tag CoNLL files
    #[arg(long)]
    conll: bool,
}

impl Cli {
    fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig::new()
            .with_seed(self.seed)
            .with_test_size(self.test_size)
            .with_validation_size(self.validation_size)
            .with_conll(self.conll)
    }
}

fn run(cli: &Cli) -> Result<PathBuf> {
    ensure_absent(&cli.output_dir)?;

    let examples = load_examples(&cli.input_file)
        .with_context(|| format!("failed to read {}", cli.input_file.display()))?;

    let config = cli.dataset_config();
    let splits = build_dataset(&examples, &cli.field_name, &config)?;
    let data_dir = write_dataset(&splits, &cli.output_dir, &config)
        .with_context(|| format!("failed to write dataset to {}", cli.output_dir.display()))?;

    Ok(data_dir)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = run(&cli)?;
    info!(dir = %data_dir.display(), "done");
    Ok(())
}
