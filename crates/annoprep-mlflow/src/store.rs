//! Tracking store addressing and local `mlruns` layout.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{MlflowError, Result};

/// Where runs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingStore {
    /// A tracking server base URL, without trailing slash.
    Remote(String),
    /// The root of a file store (`<root>/<experiment_id>/<run_id>/artifacts`).
    Local(PathBuf),
}

impl TrackingStore {
    /// Parses a tracking URI.
    ///
    /// `http://` and `https://` address a server, `file://` and bare paths a
    /// local store. Any other scheme is rejected.
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(MlflowError::UnsupportedUri(uri.to_string()));
        }

        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(TrackingStore::Remote(uri.trim_end_matches('/').to_string()));
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(TrackingStore::Local(PathBuf::from(path)));
        }
        if uri.contains("://") {
            return Err(MlflowError::UnsupportedUri(uri.to_string()));
        }
        Ok(TrackingStore::Local(PathBuf::from(uri)))
    }

    /// Finds the artifact directory of a run in a local store.
    ///
    /// Returns `None` for remote stores and when no experiment holds the run.
    pub fn find_local_artifacts(
        &self,
        run_id: &str,
        artifact_path: &str,
    ) -> Result<Option<PathBuf>> {
        let TrackingStore::Local(root) = self else {
            return Ok(None);
        };

        for entry in std::fs::read_dir(root)? {
            let experiment = entry?.path();
            if !experiment.is_dir() {
                continue;
            }
            let run_dir = experiment.join(run_id);
            if run_dir.is_dir() {
                debug!(run = %run_dir.display(), "found run in local store");
                return Ok(Some(run_dir.join("artifacts").join(artifact_path)));
            }
        }
        Ok(None)
    }
}

/// Run ids are hex in MLflow; anything path-like is refused.
pub(crate) fn validate_run_id(run_id: &str) -> Result<()> {
    let valid = !run_id.is_empty()
        && run_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MlflowError::InvalidRunId(run_id.to_string()))
    }
}

/// Artifact paths must stay inside the run's artifact root.
pub(crate) fn validate_artifact_path(artifact_path: &str) -> Result<()> {
    let path = Path::new(artifact_path);
    let valid = !artifact_path.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(MlflowError::InvalidArtifactPath(artifact_path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        assert_eq!(
            TrackingStore::parse("http://localhost:5000/").unwrap(),
            TrackingStore::Remote("http://localhost:5000".into())
        );
        assert!(matches!(
            TrackingStore::parse("https://mlflow.example.org").unwrap(),
            TrackingStore::Remote(_)
        ));
    }

    #[test]
    fn test_parse_local() {
        assert_eq!(
            TrackingStore::parse("file:///srv/mlruns").unwrap(),
            TrackingStore::Local(PathBuf::from("/srv/mlruns"))
        );
        assert_eq!(
            TrackingStore::parse("./mlruns").unwrap(),
            TrackingStore::Local(PathBuf::from("./mlruns"))
        );
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(TrackingStore::parse("databricks://profile").is_err());
        assert!(TrackingStore::parse("s3://bucket/mlruns").is_err());
        assert!(TrackingStore::parse("  ").is_err());
    }

    #[test]
    fn test_find_local_artifacts() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("0")).unwrap();
        std::fs::create_dir_all(root.path().join("7/abc123/artifacts/model")).unwrap();
        std::fs::write(root.path().join("meta.yaml"), "").unwrap();

        let store = TrackingStore::Local(root.path().to_path_buf());
        let found = store.find_local_artifacts("abc123", "model").unwrap();
        assert_eq!(found, Some(root.path().join("7/abc123/artifacts/model")));
        assert_eq!(store.find_local_artifacts("ffff", "model").unwrap(), None);
    }

    #[test]
    fn test_remote_has_no_local_artifacts() {
        let store = TrackingStore::Remote("http://localhost:5000".into());
        assert_eq!(store.find_local_artifacts("abc", "model").unwrap(), None);
    }

    #[test]
    fn test_validation() {
        assert!(validate_run_id("0a1b2c3d").is_ok());
        assert!(validate_run_id("../etc").is_err());
        assert!(validate_run_id("").is_err());

        assert!(validate_artifact_path("model").is_ok());
        assert!(validate_artifact_path("checkpoints/best").is_ok());
        assert!(validate_artifact_path("../model").is_err());
        assert!(validate_artifact_path("/model").is_err());
    }
}
