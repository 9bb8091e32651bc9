//! Configuration for the downloader system
//!
//! Fixed at process start and shared read-only by every request.

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::downloader::core::{
    AllowedRoots, BatchOptions, ContentTypePolicy, DownloadError, DownloadRequest, Result,
};

const ENV_ALLOWED_ROOTS: &str = "URL_DOWNLOADER_ALLOWED_ROOTS";
const ENV_DEFAULT_DIR: &str = "URL_DOWNLOADER_DEFAULT_DIR";
const ENV_CONTENT_TYPES: &str = "URL_DOWNLOADER_CONTENT_TYPES";
const ENV_MAX_CONCURRENT: &str = "URL_DOWNLOADER_MAX_CONCURRENT";
const ENV_USER_AGENT: &str = "URL_DOWNLOADER_USER_AGENT";

/// Configuration for download operations
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directories downloads may be written under
    pub allowed_roots: AllowedRoots,
    /// Used when a request names no output directory
    pub default_output_dir: PathBuf,
    /// Accepted response media types
    pub content_types: ContentTypePolicy,
    pub user_agent: String,
    /// Time allowed for establishing a TCP/TLS connection
    pub connect_timeout: Duration,
    /// Largest per-request timeout a caller may ask for
    pub max_timeout: Duration,
    /// Largest per-request size limit a caller may ask for
    pub max_size_limit_bytes: u64,
    /// Batches above this size are rejected outright
    pub max_batch_urls: usize,
    /// Transfers in flight at once within one batch
    pub max_concurrent_downloads: usize,
    /// Redirect hops followed before giving up
    pub max_redirects: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        let default_output_dir = dirs::home_dir()
            .map(|home| home.join("Downloads"))
            .unwrap_or_else(|| PathBuf::from("Downloads"));

        Self {
            allowed_roots: AllowedRoots::user_defaults(),
            default_output_dir,
            content_types: ContentTypePolicy::default(),
            user_agent: format!("url-downloader/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(10),
            max_timeout: Duration::from_secs(300),
            max_size_limit_bytes: 500 * 1024 * 1024,
            max_batch_urls: 100,
            max_concurrent_downloads: 10,
            max_redirects: 10,
        }
    }
}

impl DownloadConfig {
    /// Confine downloads to `roots`, defaulting to the first of them
    pub fn with_allowed_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        if let Some(first) = roots.first() {
            self.default_output_dir = first.clone();
        }
        self.allowed_roots = AllowedRoots::new(roots);
        self
    }

    pub fn with_content_types(mut self, content_types: ContentTypePolicy) -> Self {
        self.content_types = content_types;
        self
    }

    pub fn with_max_concurrent_downloads(mut self, max: usize) -> Self {
        self.max_concurrent_downloads = max;
        self
    }

    /// Defaults overridden from the environment (and a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            debug!("Loaded environment variables from .env file");
        }

        let mut config = Self::default();

        if let Some(roots) = std::env::var_os(ENV_ALLOWED_ROOTS) {
            let roots: Vec<PathBuf> = std::env::split_paths(&roots)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if roots.is_empty() {
                return Err(config_error(ENV_ALLOWED_ROOTS, "no directories given"));
            }
            config = config.with_allowed_roots(roots);
        }

        if let Some(dir) = std::env::var_os(ENV_DEFAULT_DIR) {
            config.default_output_dir = PathBuf::from(dir);
        }

        if let Ok(types) = std::env::var(ENV_CONTENT_TYPES) {
            let policy = ContentTypePolicy::new(types.split(',').map(str::trim));
            if policy.is_empty() {
                return Err(config_error(ENV_CONTENT_TYPES, "no media types given"));
            }
            config.content_types = policy;
        }

        if let Ok(value) = std::env::var(ENV_MAX_CONCURRENT) {
            config.max_concurrent_downloads = value
                .trim()
                .parse()
                .map_err(|_| config_error(ENV_MAX_CONCURRENT, "expected a positive integer"))?;
        }

        if let Ok(agent) = std::env::var(ENV_USER_AGENT) {
            config.user_agent = agent;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.allowed_roots.is_empty() {
            return Err(config_error("allowed_roots", "at least one directory is required"));
        }
        if self.max_concurrent_downloads == 0 {
            return Err(config_error("max_concurrent_downloads", "must be at least 1"));
        }
        if self.max_batch_urls == 0 {
            return Err(config_error("max_batch_urls", "must be at least 1"));
        }
        let default_dir = self.default_output_dir.to_string_lossy();
        if self.allowed_roots.resolve(&default_dir).is_err() {
            return Err(config_error(
                "default_output_dir",
                "must be inside one of the allowed roots",
            ));
        }
        Ok(())
    }

    /// Reject timeouts and size limits outside what callers may request
    pub fn check_limits(&self, timeout: Duration, max_size_bytes: u64) -> Result<()> {
        if timeout < Duration::from_secs(1) || timeout > self.max_timeout {
            return Err(DownloadError::InvalidArgument {
                field: "timeout",
                message: format!("must be between 1 and {} seconds", self.max_timeout.as_secs()),
            });
        }
        if max_size_bytes == 0 || max_size_bytes > self.max_size_limit_bytes {
            return Err(DownloadError::InvalidArgument {
                field: "max_size_mb",
                message: format!(
                    "must be between 1 and {} MB",
                    self.max_size_limit_bytes / (1024 * 1024)
                ),
            });
        }
        Ok(())
    }

    pub fn check_request(&self, request: &DownloadRequest) -> Result<()> {
        self.check_limits(request.timeout, request.max_size_bytes)
    }

    pub fn check_batch_options(&self, options: &BatchOptions) -> Result<()> {
        self.check_limits(options.timeout, options.max_size_bytes)
    }
}

fn config_error(field: &str, message: &str) -> DownloadError {
    DownloadError::Configuration {
        message: format!("{}: {}", field, message),
        field: Some(field.to_string()),
    }
}
