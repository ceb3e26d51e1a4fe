use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::MlflowConfig;
use crate::error::{MlflowError, Result};
use crate::store::{TrackingStore, validate_artifact_path, validate_run_id};

/// Response body of `GET /api/2.0/mlflow/runs/get`.
#[derive(Deserialize)]
struct GetRunResponse {
    run: Run,
}

#[derive(Deserialize)]
struct Run {
    info: RunInfo,
}

#[derive(Deserialize)]
struct RunInfo {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    lifecycle_stage: Option<String>,
}

/// Error body of the tracking server REST API.
#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// Resolves run artifacts to a local directory.
pub struct MlflowClient {
    config: MlflowConfig,
    store: TrackingStore,
    http: reqwest::blocking::Client,
}

impl MlflowClient {
    pub fn new(config: MlflowConfig) -> Result<Self> {
        let store = TrackingStore::parse(&config.tracking_uri)?;
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MlflowError::Http(e.to_string()))?;

        Ok(Self { config, store, http })
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    /// Cache directory for one run's artifact path.
    pub fn cache_dir_for(&self, run_id: &str, artifact_path: &str) -> PathBuf {
        self.config.cache_root().join(run_id).join(artifact_path)
    }

    /// Returns a local directory holding `files` from `runs:/<run_id>/<artifact_path>`.
    ///
    /// Local stores are read in place. Remote artifacts are downloaded into
    /// the cache, and a fully cached run is served without contacting the
    /// server.
    ///
    /// # Errors
    ///
    /// Fails if the run or any of `files` cannot be found, or on transport
    /// and filesystem errors.
    pub fn resolve_artifacts(
        &self,
        run_id: &str,
        artifact_path: &str,
        files: &[&str],
    ) -> Result<PathBuf> {
        validate_run_id(run_id)?;
        validate_artifact_path(artifact_path)?;

        match &self.store {
            TrackingStore::Local(root) => {
                let dir = self
                    .store
                    .find_local_artifacts(run_id, artifact_path)?
                    .ok_or_else(|| MlflowError::RunNotFound(run_id.to_string()))?;
                require_files(run_id, &dir, files)?;
                info!(
                    store = %root.display(),
                    dir = %dir.display(),
                    "resolved local run artifacts"
                );
                Ok(dir)
            }
            TrackingStore::Remote(base_url) => {
                let dir = self.cache_dir_for(run_id, artifact_path);
                if files.iter().all(|f| dir.join(f).is_file()) {
                    info!(dir = %dir.display(), "using cached run artifacts");
                    return Ok(dir);
                }

                self.check_run(base_url, run_id)?;
                std::fs::create_dir_all(&dir)?;
                for file in files {
                    let target = dir.join(file);
                    if target.is_file() {
                        debug!(file, "already cached");
                        continue;
                    }
                    self.download(base_url, run_id, &format!("{artifact_path}/{file}"), &target)?;
                }
                info!(
                    server = %base_url,
                    dir = %dir.display(),
                    files = files.len(),
                    "downloaded run artifacts"
                );
                Ok(dir)
            }
        }
    }

    fn check_run(&self, base_url: &str, run_id: &str) -> Result<()> {
        let url = format!("{base_url}/api/2.0/mlflow/runs/get");
        let response = self
            .http
            .get(&url)
            .query(&[("run_id", run_id)])
            .send()
            .map_err(|e| self.transport_error(base_url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MlflowError::RunNotFound(run_id.to_string()));
        }
        if !status.is_success() {
            return Err(server_error(status.as_u16(), &error_body(response), run_id));
        }

        let parsed: GetRunResponse = response
            .json()
            .map_err(|e| MlflowError::ResponseParsing(e.to_string()))?;
        if parsed.run.info.lifecycle_stage.as_deref() == Some("deleted") {
            return Err(MlflowError::RunNotFound(run_id.to_string()));
        }
        match parsed.run.info.status.as_deref() {
            Some("FINISHED") | None => {}
            Some(status) => warn!(run_id, status, "run has not finished"),
        }
        Ok(())
    }

    fn download(&self, base_url: &str, run_id: &str, path: &str, target: &Path) -> Result<()> {
        let url = format!("{base_url}/get-artifact");
        debug!(path, "downloading artifact");

        let mut response = self
            .http
            .get(&url)
            .query(&[("path", path), ("run_uuid", run_id)])
            .send()
            .map_err(|e| self.transport_error(base_url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MlflowError::MissingArtifact {
                run_id: run_id.to_string(),
                path: PathBuf::from(path),
            });
        }
        if !status.is_success() {
            return Err(server_error(status.as_u16(), &error_body(response), run_id));
        }

        write_atomically(&mut response, target)
    }

    fn transport_error(&self, base_url: &str, e: reqwest::Error) -> MlflowError {
        if e.is_connect() {
            MlflowError::Connection(base_url.to_string())
        } else if e.is_timeout() {
            MlflowError::Http(format!("request timed out after {}s", self.config.timeout_secs))
        } else {
            MlflowError::Http(e.to_string())
        }
    }
}

/// Streams `source` into `<target>.part`, then renames it onto `target`.
///
/// On failure the partial file is removed, so an interrupted download is
/// fetched again on the next run.
fn write_atomically<R: Read>(source: &mut R, target: &Path) -> Result<()> {
    let mut partial = target.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let written = File::create(&partial).and_then(|mut file| {
        std::io::copy(source, &mut file)?;
        file.sync_all()
    });

    match written {
        Ok(()) => {
            std::fs::rename(&partial, target)?;
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                warn!(
                    path = %partial.display(),
                    error = %cleanup,
                    "failed to remove partial download"
                );
            }
            Err(e.into())
        }
    }
}

/// Error response body, or a note on why it could not be read.
fn error_body(response: reqwest::blocking::Response) -> String {
    response
        .text()
        .unwrap_or_else(|e| format!("<unreadable response body: {e}>"))
}

fn require_files(run_id: &str, dir: &Path, files: &[&str]) -> Result<()> {
    match files.iter().find(|f| !dir.join(f).is_file()) {
        Some(missing) => Err(MlflowError::MissingArtifact {
            run_id: run_id.to_string(),
            path: dir.join(missing),
        }),
        None => Ok(()),
    }
}

fn server_error(status: u16, body: &str, run_id: &str) -> MlflowError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api) if api.error_code == "RESOURCE_DOES_NOT_EXIST" => {
            MlflowError::RunNotFound(run_id.to_string())
        }
        Ok(api) if !api.message.is_empty() => MlflowError::Server {
            status,
            message: api.message,
        },
        _ => MlflowError::Server {
            status,
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILES: &[&str] = &["config.json", "tokenizer.json"];

    fn local_store() -> (tempfile::TempDir, MlflowClient) {
        let root = tempfile::tempdir().unwrap();
        let model = root.path().join("3/run42/artifacts/model");
        std::fs::create_dir_all(&model).unwrap();
        for file in FILES {
            std::fs::write(model.join(file), "{}").unwrap();
        }
        let uri = format!("file://{}", root.path().display());
        let client = MlflowClient::new(MlflowConfig::new(uri)).unwrap();
        (root, client)
    }

    #[test]
    fn test_resolves_local_run() {
        let (root, client) = local_store();
        let dir = client.resolve_artifacts("run42", "model", FILES).unwrap();
        assert_eq!(dir, root.path().join("3/run42/artifacts/model"));
    }

    #[test]
    fn test_local_missing_run() {
        let (_root, client) = local_store();
        let err = client.resolve_artifacts("run43", "model", FILES).unwrap_err();
        assert!(matches!(err, MlflowError::RunNotFound(id) if id == "run43"));
    }

    #[test]
    fn test_local_missing_file() {
        let (_root, client) = local_store();
        let err = client
            .resolve_artifacts("run42", "model", &["model.safetensors"])
            .unwrap_err();
        assert!(matches!(err, MlflowError::MissingArtifact { .. }));
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let (_root, client) = local_store();
        assert!(matches!(
            client.resolve_artifacts("../3", "model", FILES),
            Err(MlflowError::InvalidRunId(_))
        ));
        assert!(matches!(
            client.resolve_artifacts("run42", "../../etc", FILES),
            Err(MlflowError::InvalidArtifactPath(_))
        ));
    }

    #[test]
    fn test_cached_remote_run_needs_no_server() {
        let cache = tempfile::tempdir().unwrap();
        // nothing listens on port 9 (discard)
        let config = MlflowConfig::new("http://127.0.0.1:9").with_cache_dir(cache.path());
        let client = MlflowClient::new(config).unwrap();

        let dir = client.cache_dir_for("abc", "model");
        assert_eq!(dir, cache.path().join("annoprep/runs/abc/model"));
        std::fs::create_dir_all(&dir).unwrap();
        for file in FILES {
            std::fs::write(dir.join(file), "{}").unwrap();
        }

        assert_eq!(client.resolve_artifacts("abc", "model", FILES).unwrap(), dir);
    }

    /// Yields some bytes, then fails like a dropped connection.
    struct BrokenStream {
        sent: bool,
    }

    impl Read for BrokenStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"{\"a\"");
            Ok(4)
        }
    }

    #[test]
    fn test_interrupted_download_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("model.safetensors");

        let err = write_atomically(&mut BrokenStream { sent: false }, &target).unwrap_err();
        assert!(matches!(err, MlflowError::Io(_)));
        assert!(!target.exists());
        assert!(!dir.path().join("model.safetensors.part").exists());
    }

    #[test]
    fn test_completed_download_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config.json");

        write_atomically(&mut &b"{}"[..], &target).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
        assert!(!dir.path().join("config.json.part").exists());
    }

    #[test]
    fn test_server_error_messages() {
        let body = r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "Run 'x' not found"}"#;
        assert!(matches!(server_error(404, body, "x"), MlflowError::RunNotFound(_)));

        let body = r#"{"error_code": "INTERNAL_ERROR", "message": "boom"}"#;
        assert_eq!(server_error(500, body, "x").to_string(), "tracking server returned 500: boom");

        assert_eq!(
            server_error(502, "Bad Gateway", "x").to_string(),
            "tracking server returned 502: Bad Gateway"
        );
    }
}
