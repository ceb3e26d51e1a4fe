//! # Dataset Pipeline
//!
//! Extraction → features → three-way split → coverage check → files.
//! Every check runs before the output directory is created, so a failed run
//! leaves nothing on disk.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use super::config::DatasetConfig;
use super::coverage::check_coverage;
use super::feature::{FeatureRow, build_features};
use super::split::Splitter;
use crate::annotation::{AnnotatedText, Example, extract_annotations, write_conll};
use crate::error::{AnnoprepError, Result};
use crate::table::write_csv_file;

/// Rows of one partition together with the examples they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetPart {
    pub rows: Vec<FeatureRow>,
    pub examples: Vec<AnnotatedText>,
}

/// The train, validation and test partitions of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSplits {
    pub train: DatasetPart,
    pub validation: DatasetPart,
    pub test: DatasetPart,
}

impl DatasetSplits {
    /// Splits examples into train/validation/test.
    ///
    /// The test part is cut first, then validation is cut from what remains.
    /// Rows and examples share each permutation.
    pub fn split(examples: Vec<AnnotatedText>, config: &DatasetConfig) -> Result<Self> {
        let rows = build_features(&examples);
        let mut splitter = Splitter::new(config.seed);

        let outer = splitter.partition(rows.len(), config.test_size)?;
        let (rows_rest, test_rows) = outer.apply(&rows)?;
        let (examples_rest, test_examples) = outer.apply(&examples)?;

        let inner = splitter.partition(rows_rest.len(), config.validation_size)?;
        let (train_rows, validation_rows) = inner.apply(&rows_rest)?;
        let (train_examples, validation_examples) = inner.apply(&examples_rest)?;

        Ok(Self {
            train: DatasetPart {
                rows: train_rows,
                examples: train_examples,
            },
            validation: DatasetPart {
                rows: validation_rows,
                examples: validation_examples,
            },
            test: DatasetPart {
                rows: test_rows,
                examples: test_examples,
            },
        })
    }

    /// Runs the label coverage check over the three partitions.
    pub fn check_coverage(&self) -> Result<()> {
        check_coverage(&self.train.rows, &self.validation.rows, &self.test.rows)
    }

    /// Partitions with their file stem, in output order.
    pub fn parts(&self) -> [(&'static str, &DatasetPart); 3] {
        [
            ("train", &self.train),
            ("validation", &self.validation),
            ("test", &self.test),
        ]
    }
}

/// Extracts, splits and validates a dataset from an annotation export.
///
/// # Errors
///
/// Fails on malformed examples, invalid split fractions, or when validation
/// or test carry labels absent from train.
pub fn build_dataset(
    examples: &[Example],
    field_name: &str,
    config: &DatasetConfig,
) -> Result<DatasetSplits> {
    let annotated = extract_annotations(examples, field_name)?;
    let splits = DatasetSplits::split(annotated, config)?;
    splits.check_coverage()?;

    info!(
        train = splits.train.rows.len(),
        validation = splits.validation.rows.len(),
        test = splits.test.rows.len(),
        "split dataset"
    );
    Ok(splits)
}

/// Fails if `output_dir` already exists.
pub fn ensure_absent(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        return Err(AnnoprepError::OutputExists(output_dir.to_path_buf()));
    }
    Ok(())
}

/// Writes `<output_dir>/data/{train,validation,test}.csv` (and `.conll` files
/// when enabled). Returns the data directory.
///
/// # Errors
///
/// Returns `AnnoprepError::OutputExists` without touching the filesystem if
/// `output_dir` already exists.
pub fn write_dataset(
    splits: &DatasetSplits,
    output_dir: &Path,
    config: &DatasetConfig,
) -> Result<PathBuf> {
    ensure_absent(output_dir)?;

    let data_dir = output_dir.join("data");
    fs::create_dir_all(&data_dir)?;

    for (name, part) in splits.parts() {
        write_csv_file(data_dir.join(format!("{name}.csv")), &part.rows)?;
        if config.emit_conll {
            let file = File::create(data_dir.join(format!("{name}.conll")))?;
            write_conll(BufWriter::new(file), &part.examples)?;
        }
    }

    info!(dir = %data_dir.display(), "dataset written");
    Ok(data_dir)
}
