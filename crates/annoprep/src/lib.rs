//! # annoprep
//!
//! Dataset preparation for annotated text: NER features with seeded
//! train/validation/test splits, boundary-detection segments, and
//! boundary marking with a token classifier pulled from an MLflow run.
//!
//! This crate re-exports [`annoprep_core`] at its root and the MLflow
//! artifact client as [`mlflow`].

pub use annoprep_core::*;

pub mod mlflow {
    pub use annoprep_mlflow::*;
}
