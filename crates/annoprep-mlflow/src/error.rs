use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving MLflow run artifacts.
#[derive(Debug, Error)]
pub enum MlflowError {
    /// The tracking URI scheme is not one this client can read.
    #[error("unsupported tracking URI: {0}")]
    UnsupportedUri(String),

    #[error("invalid run id: {0:?}")]
    InvalidRunId(String),

    #[error("invalid artifact path: {0:?}")]
    InvalidArtifactPath(String),

    /// The tracking server could not be reached.
    #[error("cannot connect to tracking server at {0}")]
    Connection(String),

    #[error("http client error: {0}")]
    Http(String),

    /// The tracking server answered with a non-success status.
    #[error("tracking server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("run {0} not found")]
    RunNotFound(String),

    /// A required file is absent from the run's artifacts.
    #[error("artifact {path:?} missing from run {run_id}")]
    MissingArtifact { run_id: String, path: PathBuf },

    #[error("unexpected tracking server response: {0}")]
    ResponseParsing(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MlflowError>;
