//! # annoprep MLflow
//!
//! Fetches the model artifacts of an MLflow run so they can be loaded from
//! disk. Supports tracking servers over HTTP (artifacts are cached locally)
//! and file stores laid out as `mlruns/<experiment>/<run>/artifacts`.

pub mod client;
pub mod config;
pub mod error;
pub mod store;

pub use client::MlflowClient;
pub use config::MlflowConfig;
pub use error::{MlflowError, Result};
pub use store::TrackingStore;
