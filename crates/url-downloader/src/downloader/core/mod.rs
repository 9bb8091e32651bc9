//! Core types used throughout the downloader system
//!
//! This module contains the request and result records plus the checks every
//! download passes through. Other modules depend on it, never the reverse.

pub mod content_type;
pub mod error;
pub mod files;
pub mod paths;
pub mod sanitize;
pub mod url_guard;

// Re-export main types for convenience
pub use content_type::ContentTypePolicy;
pub use error::{DownloadError, ErrorCategory, FileOperation, Result};
pub use files::{filename_from_url, sanitize_filename, unique_path};
pub use paths::AllowedRoots;
pub use sanitize::{redact_paths, sanitize_error};
pub use url_guard::{BlockReason, SafeUrl, check_ip, validate_url};

use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Default time budget for one download (HEAD + GET + body)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default size limit for one download
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 500 * 1024 * 1024;

/// A single download request
///
/// Built once and not changed after validation starts.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Directory to save into; `None` means the configured default
    pub output_dir: Option<String>,
    /// Override for the name derived from the URL
    pub filename: Option<String>,
    pub timeout: Duration,
    pub max_size_bytes: u64,
}

impl DownloadRequest {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            output_dir: None,
            filename: None,
            timeout: DEFAULT_TIMEOUT,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }

    pub fn with_output_dir<S: Into<String>>(mut self, output_dir: S) -> Self {
        self.output_dir = Some(output_dir.into()).filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into()).filter(|f| !f.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_max_size_mb(self, max_size_mb: u64) -> Self {
        self.with_max_size_bytes(max_size_mb.saturating_mul(1024 * 1024))
    }
}

/// Options applied uniformly to every URL of a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: Option<String>,
    pub timeout: Duration,
    pub max_size_bytes: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            timeout: DEFAULT_TIMEOUT,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl BatchOptions {
    pub fn with_output_dir<S: Into<String>>(mut self, output_dir: S) -> Self {
        self.output_dir = Some(output_dir.into()).filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_bytes = max_size_mb.saturating_mul(1024 * 1024);
        self
    }

    /// The request for one URL of the batch
    pub fn request_for<S: Into<String>>(&self, url: S) -> DownloadRequest {
        DownloadRequest {
            url: url.into(),
            output_dir: self.output_dir.clone(),
            filename: None,
            timeout: self.timeout,
            max_size_bytes: self.max_size_bytes,
        }
    }
}

/// Outcome of one download
///
/// On success `file_path` is set, on failure `error` is; never both.
/// `file_name` may be present on failure to report the name that would have
/// been used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub success: bool,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_size_bytes: Option<u64>,
    pub content_type: Option<String>,
    pub error: Option<String>,
}

impl DownloadResult {
    pub fn succeeded(file_path: &Path, file_size_bytes: u64, content_type: Option<String>) -> Self {
        Self {
            success: true,
            file_path: Some(file_path.display().to_string()),
            file_name: file_path.file_name().map(|n| n.to_string_lossy().into_owned()),
            file_size_bytes: Some(file_size_bytes),
            content_type,
            error: None,
        }
    }

    /// Failed result; the message always goes through [`sanitize_error`]
    pub fn failed(file_name: Option<String>, error: &DownloadError) -> Self {
        Self {
            success: false,
            file_path: None,
            file_name,
            file_size_bytes: None,
            content_type: None,
            error: Some(sanitize_error(error)),
        }
    }
}

/// Outcome of a batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub results: Vec<DownloadResult>,
    pub success_count: usize,
    pub failed_count: usize,
}

impl BatchResult {
    pub fn from_results(results: Vec<DownloadResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let failed_count = results.len() - success_count;
        Self {
            results,
            success_count,
            failed_count,
        }
    }
}
