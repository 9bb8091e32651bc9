//! Error types for the download pipeline, grouped by how they may be surfaced

use std::path::PathBuf;
use thiserror::Error;

use super::url_guard::BlockReason;

/// Every failure the download pipeline can produce.
///
/// Messages of validation-class variants are written for the caller and are
/// safe to show verbatim. Everything else is reduced to a fixed phrase by
/// [`sanitize_error`](super::sanitize::sanitize_error) before it leaves the crate.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Empty or unparseable URL
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("URL too long (maximum {max} characters)")]
    UrlTooLong { max: usize },

    /// Scheme other than http/https
    #[error("Unsupported protocol: {scheme}. Only http and https are allowed")]
    UnsupportedProtocol { scheme: String },

    /// `localhost`, loopback or unspecified addresses
    #[error("localhost access not allowed")]
    LocalhostBlocked,

    /// IP literal inside a private, link-local or otherwise reserved range
    #[error("Access to {reason} addresses is blocked")]
    BlockedAddress { reason: BlockReason },

    /// A DNS name resolved only to blocked addresses at connect time
    #[error("Access to the resolved address is blocked")]
    ResolvedAddressBlocked,

    /// A redirect pointed at a URL that fails validation
    #[error("Redirect target is not allowed")]
    RedirectBlocked,

    #[error("Output directory must be within allowed locations")]
    OutputDirNotAllowed,

    #[error("Maximum {max} URLs per batch allowed (got {actual})")]
    TooManyUrls { max: usize, actual: usize },

    /// Argument outside the bounds accepted by the public operations
    #[error("Invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    /// Declared or streamed size above the request limit
    #[error("File size{} exceeds maximum allowed size ({})", format_size(.size), format_limit(.limit_bytes))]
    FileTooLarge { size: Option<u64>, limit_bytes: u64 },

    #[error("Content type '{content_type}' is not allowed")]
    ContentTypeNotAllowed { content_type: String },

    /// Per-request time budget exhausted
    #[error("Request timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-success HTTP status on the GET request
    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },

    /// Connection, TLS or body-stream failures
    #[error("Network error")]
    Network {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find a free file name next to '{path}' after {attempts} attempts")]
    UniquePathExhausted { path: PathBuf, attempts: usize },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

const MIB: u64 = 1024 * 1024;

fn format_size(size: &Option<u64>) -> String {
    size.map(|s| format!(" ({} bytes)", s)).unwrap_or_default()
}

fn format_limit(limit_bytes: &u64) -> String {
    if *limit_bytes >= MIB && limit_bytes % MIB == 0 {
        format!("{} MB", limit_bytes / MIB)
    } else {
        format!("{} bytes", limit_bytes)
    }
}

/// Broad error classes; they decide how much of an error reaches the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input caught by our own checks; reported verbatim, never retried
    Validation,
    /// Network, HTTP or size-limit failures during a transfer
    Transfer,
    /// Anything unexpected; reported as a generic failure
    Internal,
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Create,
    Write,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DownloadError::InvalidUrl
            | DownloadError::UrlTooLong { .. }
            | DownloadError::UnsupportedProtocol { .. }
            | DownloadError::LocalhostBlocked
            | DownloadError::BlockedAddress { .. }
            | DownloadError::ResolvedAddressBlocked
            | DownloadError::RedirectBlocked
            | DownloadError::OutputDirNotAllowed
            | DownloadError::TooManyUrls { .. }
            | DownloadError::InvalidArgument { .. }
            | DownloadError::ContentTypeNotAllowed { .. } => ErrorCategory::Validation,
            DownloadError::FileTooLarge { .. }
            | DownloadError::Timeout { .. }
            | DownloadError::HttpStatus { .. }
            | DownloadError::Network { .. } => ErrorCategory::Transfer,
            DownloadError::FileSystem { .. }
            | DownloadError::UniquePathExhausted { .. }
            | DownloadError::Configuration { .. }
            | DownloadError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Stable label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::InvalidUrl => "invalid_url",
            DownloadError::UrlTooLong { .. } => "url_too_long",
            DownloadError::UnsupportedProtocol { .. } => "unsupported_protocol",
            DownloadError::LocalhostBlocked => "localhost_blocked",
            DownloadError::BlockedAddress { .. } => "blocked_address",
            DownloadError::ResolvedAddressBlocked => "resolved_address_blocked",
            DownloadError::RedirectBlocked => "redirect_blocked",
            DownloadError::OutputDirNotAllowed => "output_dir_not_allowed",
            DownloadError::TooManyUrls { .. } => "too_many_urls",
            DownloadError::InvalidArgument { .. } => "invalid_argument",
            DownloadError::FileTooLarge { .. } => "file_too_large",
            DownloadError::ContentTypeNotAllowed { .. } => "content_type_not_allowed",
            DownloadError::Timeout { .. } => "timeout",
            DownloadError::HttpStatus { .. } => "http_status",
            DownloadError::Network { .. } => "network",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::UniquePathExhausted { .. } => "unique_path_exhausted",
            DownloadError::Configuration { .. } => "configuration",
            DownloadError::Internal(_) => "internal",
        }
    }

    pub(crate) fn file_system(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(error: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: FileOperation::Write,
            source: error,
        }
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(_: url::ParseError) -> Self {
        DownloadError::InvalidUrl
    }
}
