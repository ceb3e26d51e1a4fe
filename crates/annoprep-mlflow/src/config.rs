use std::path::PathBuf;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for [`MlflowClient`](crate::MlflowClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlflowConfig {
    /// `http(s)://` server, `file://` URI or plain path of an `mlruns` store
    pub tracking_uri: String,
    /// Base directory for downloaded artifacts; the platform cache dir if unset
    pub cache_dir: Option<PathBuf>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for MlflowConfig {
    fn default() -> Self {
        Self {
            tracking_uri: "mlruns".to_string(),
            cache_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl MlflowConfig {
    pub fn new(tracking_uri: impl Into<String>) -> Self {
        Self {
            tracking_uri: tracking_uri.into(),
            ..Self::default()
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs.max(1);
        self
    }

    /// Root under which run artifacts are cached.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("annoprep")
            .join("runs")
    }
}
