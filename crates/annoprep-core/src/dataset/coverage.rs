use std::collections::BTreeSet;

use tracing::debug;

use super::feature::FeatureRow;
use crate::error::{AnnoprepError, Result};

/// Distinct labels appearing in `rows`.
pub fn label_set(rows: &[FeatureRow]) -> BTreeSet<&str> {
    rows.iter()
        .flat_map(|row| row.tags.iter().map(String::as_str))
        .collect()
}

/// Checks that validation and test only use labels seen in train.
///
/// # Errors
///
/// Returns `AnnoprepError::CoverageViolation` listing the labels missing from
/// train for each held-out partition.
pub fn check_coverage(
    train: &[FeatureRow],
    validation: &[FeatureRow],
    test: &[FeatureRow],
) -> Result<()> {
    let train_labels = label_set(train);
    let validation_missing = missing_labels(validation, &train_labels);
    let test_missing = missing_labels(test, &train_labels);
    debug!(train_labels = train_labels.len(), "checked label coverage");

    if validation_missing.is_empty() && test_missing.is_empty() {
        Ok(())
    } else {
        Err(AnnoprepError::CoverageViolation {
            validation: validation_missing,
            test: test_missing,
        })
    }
}

fn missing_labels(rows: &[FeatureRow], known: &BTreeSet<&str>) -> Vec<String> {
    label_set(rows)
        .into_iter()
        .filter(|label| !known.contains(label))
        .map(str::to_string)
        .collect()
}
