use thiserror::Error;

/// Errors that can occur during annoprep core operations.
#[derive(Debug, Error)]
pub enum AnnoprepError {
    /// Split arguments were rejected before any shuffling happened.
    #[error("invalid split arguments: {0}")]
    InvalidSplit(String),

    /// An example in the annotation export does not have the expected shape.
    #[error("malformed example #{index}{}: {reason}", task_suffix(.task_id))]
    MalformedExample {
        /// Position of the example in the export.
        index: usize,
        /// The task's own `id`, when the export carries one.
        task_id: Option<String>,
        /// What was missing or unexpected.
        reason: String,
    },

    /// Validation or test partitions carry labels the train partition never saw.
    #[error(
        "the labels in the training data do not include those found in the validation and test data \
         (missing from train: validation={validation:?}, test={test:?})"
    )]
    CoverageViolation {
        /// Labels present in validation but absent from train.
        validation: Vec<String>,
        /// Labels present in test but absent from train.
        test: Vec<String>,
    },

    /// The output location already exists and would be overwritten.
    #[error("the folder {0:?} already exists")]
    OutputExists(std::path::PathBuf),

    /// A report text has no entry in the metadata lookup table.
    #[error("report not found in metadata table: {preview:?}")]
    ReportNotFound {
        /// Leading characters of the report text.
        preview: String,
    },

    /// A required column is missing from a tabular input.
    #[error("missing column {0:?} in table header")]
    MissingColumn(String),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// JSON decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading or writing failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The model files could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    /// The model inference failed.
    #[error("inference error: {0}")]
    InferenceError(String),

    /// Candle ML framework error.
    #[error("ML inference error: {0}")]
    CandleError(String),
}

impl From<candle_core::Error> for AnnoprepError {
    fn from(e: candle_core::Error) -> Self {
        AnnoprepError::CandleError(e.to_string())
    }
}

impl AnnoprepError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        AnnoprepError::MalformedExample {
            index,
            task_id: None,
            reason: reason.into(),
        }
    }

    /// Attaches a task id to a `MalformedExample` that has none yet.
    pub(crate) fn with_task_id(self, id: Option<String>) -> Self {
        match self {
            AnnoprepError::MalformedExample {
                index,
                task_id: None,
                reason,
            } => AnnoprepError::MalformedExample {
                index,
                task_id: id,
                reason,
            },
            other => other,
        }
    }
}

fn task_suffix(task_id: &Option<String>) -> String {
    task_id.as_ref().map(|id| format!(" (id {id})")).unwrap_or_default()
}

/// Result type alias for annoprep operations.
pub type Result<T> = std::result::Result<T, AnnoprepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = AnnoprepError::InvalidSplit("test_size must be between 0 and 1".into());
        assert_eq!(
            err.to_string(),
            "invalid split arguments: test_size must be between 0 and 1"
        );

        let err = AnnoprepError::malformed(3, "labels list is empty");
        assert_eq!(err.to_string(), "malformed example #3: labels list is empty");

        let err = err.with_task_id(Some("81".into()));
        assert_eq!(err.to_string(), "malformed example #3 (id 81): labels list is empty");
    }

    #[test]
    fn task_id_is_set_once_and_only_on_malformed() {
        let err = AnnoprepError::malformed(0, "x")
            .with_task_id(Some("a".into()))
            .with_task_id(Some("b".into()));
        assert!(matches!(
            err,
            AnnoprepError::MalformedExample { task_id: Some(ref id), .. } if id == "a"
        ));

        let err = AnnoprepError::MissingColumn("REPORT".into()).with_task_id(Some("a".into()));
        assert!(!err.to_string().contains("(id a)"));
    }

    #[test]
    fn coverage_violation_lists_missing_labels() {
        let err = AnnoprepError::CoverageViolation {
            validation: vec!["B".into()],
            test: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("validation=[\"B\"]"));
        assert!(msg.contains("test=[]"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnnoprepError>();
    }
}
