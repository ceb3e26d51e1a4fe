use serde::{Deserialize, Serialize};

use crate::annotation::AnnotatedText;
use crate::error::Result;
use crate::table::TableRow;

/// One row of the NER feature table.
///
/// `indices` and `tags` are parallel: `tags[i]` labels the entity starting
/// at character offset `indices[i]`, and both are ordered by offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Original example text.
    pub text: String,

    /// Entity start offsets, ascending.
    pub indices: Vec<usize>,

    /// Entity labels, aligned with `indices`.
    pub tags: Vec<String>,
}

impl FeatureRow {
    /// Builds the row for one example.
    #[must_use]
    pub fn from_annotated(example: &AnnotatedText) -> Self {
        let (indices, tags): (Vec<usize>, Vec<String>) = example
            .sorted_entities()
            .into_iter()
            .map(|e| (e.start, e.label.clone()))
            .unzip();

        Self {
            text: example.text.clone(),
            indices,
            tags,
        }
    }
}

impl TableRow for FeatureRow {
    const HEADER: &'static [&'static str] = &["Text", "Indices", "Tags"];

    /// Lists are encoded as JSON arrays.
    fn to_record(&self) -> Result<Vec<String>> {
        Ok(vec![
            self.text.clone(),
            serde_json::to_string(&self.indices)?,
            serde_json::to_string(&self.tags)?,
        ])
    }
}

/// Builds one feature row per example.
pub fn build_features(examples: &[AnnotatedText]) -> Vec<FeatureRow> {
    examples.iter().map(FeatureRow::from_annotated).collect()
}
