//! Boundary inference tool
//!
//! Fetches a token classification model from an MLflow run, runs it over a
//! text and prints the text with a space inserted before every entity.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use annoprep::inference::MODEL_FILES;
use annoprep::mlflow::{MlflowClient, MlflowConfig};
use annoprep::{AggregationStrategy, ClassifierConfig, Segmenter, TokenClassifier};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "annoprep-infer")]
#[command(about = "Mark entity boundaries in a text with a model logged to MLflow")]
#[command(version)]
struct Cli {
    /// MLflow tracking server URL, file:// URI or mlruns path
    #[arg(long = "tracking_uri", env = "MLFLOW_TRACKING_URI")]
    tracking_uri: String,

    /// Run holding the model
    #[arg(long = "run_id")]
    run_id: String,

    /// Text to segment
    #[arg(long)]
    text: String,

    /// Artifact path of the model inside the run
    #[arg(long = "artifact_path", default_value = "model")]
    artifact_path: String,

    /// Wordpiece aggregation strategy (simple, none)
    #[arg(long, default_value = "simple")]
    aggregation: AggregationStrategy,

    /// Directory for downloaded artifacts
    #[arg(long = "cache_dir", env = "ANNOPREP_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long = "timeout_secs", default_value_t = 300)]
    timeout_secs: u64,
}

impl Cli {
    fn mlflow_config(&self) -> MlflowConfig {
        let config = MlflowConfig::new(&self.tracking_uri).with_timeout_secs(self.timeout_secs);
        match &self.cache_dir {
            Some(dir) => config.with_cache_dir(dir),
            None => config,
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let client = MlflowClient::new(cli.mlflow_config())?;
    let model_dir = client
        .resolve_artifacts(&cli.run_id, &cli.artifact_path, MODEL_FILES)
        .with_context(|| format!("failed to fetch model of run {}", cli.run_id))?;

    let config = ClassifierConfig::new().with_aggregation(cli.aggregation);
    let classifier = TokenClassifier::from_dir(&model_dir, config)
        .with_context(|| format!("failed to load model from {}", model_dir.display()))?;
    info!(labels = classifier.labels().len(), "model ready");

    let segmenter = Segmenter::new(classifier)?;
    Ok(segmenter.segment(&cli.text)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    println!("{}", run(&cli)?);
    Ok(())
}
