//! # annoprep Core
//!
//! Converts Label Studio annotation exports into supervised datasets for
//! named-entity recognition and boundary detection, and runs token
//! classification models over raw text.
//!
//! ## Quick Start
//!
//! ```rust
//! use annoprep_core::annotation::{extract_annotations, read_examples};
//! use annoprep_core::dataset::build_features;
//!
//! let export = r#"[{
//!     "data": {"text": "Alice met Bob"},
//!     "total_annotations": 1,
//!     "annotations": [{"result": [
//!         {"id": "a", "value": {"text": "Bob", "start": 10, "labels": ["PER"]}},
//!         {"id": "b", "value": {"text": "Alice ", "start": 0, "labels": ["PER"]}}
//!     ]}]
//! }]"#;
//!
//! let examples = read_examples(export.as_bytes()).unwrap();
//! let annotated = extract_annotations(&examples, "text").unwrap();
//! let features = build_features(&annotated);
//!
//! assert_eq!(features[0].indices, vec![0, 10]);
//! assert_eq!(features[0].tags, vec!["PER", "PER"]);
//! ```
pub mod annotation;
pub mod boundary;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod normalize;
pub mod table;

// Re-export primary API
pub use annotation::{
    AnnotatedText, BioTag, EntityAnnotation, Example, RelationAnnotation, TokenSpan,
    extract_annotations, load_examples, read_examples,
};
pub use boundary::{BoundarySegment, ReportIndex, SENTINEL_TAG, build_segments};
pub use dataset::{
    DatasetConfig, DatasetSplits, FeatureRow, Partition, Splitter, build_dataset, build_features,
    check_coverage, train_test_split, write_dataset,
};
pub use error::{AnnoprepError, Result};
pub use inference::{
    AggregationStrategy, ClassifierConfig, EntityRecognizer, RecognizedEntity, Segmenter,
    TokenClassifier, mark_boundaries,
};
pub use normalize::TextNormalizer;
pub use table::{TableRow, write_csv, write_csv_file};
