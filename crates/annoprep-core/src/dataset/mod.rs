pub mod builder;
pub mod config;
pub mod coverage;
pub mod feature;
pub mod split;

pub use builder::{DatasetPart, DatasetSplits, build_dataset, ensure_absent, write_dataset};
pub use config::DatasetConfig;
pub use coverage::{check_coverage, label_set};
pub use feature::{FeatureRow, build_features};
pub use split::{Partition, Splitter, train_test_split};
