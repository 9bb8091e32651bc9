//! Downloader module
//!
//! This module contains all the download functionality including
//! core checks, configuration, the transport and batch operations.

pub mod backends;
pub mod batch;
pub mod config;
pub mod core;
pub mod r#lib;
pub mod single;
pub mod transport;

// Re-export main types for convenience
pub use r#lib::Downloader;
pub use backends::{GuardedResolver, HttpTransport};
pub use config::DownloadConfig;
pub use self::core::{
    AllowedRoots, BatchOptions, BatchResult, BlockReason, ContentTypePolicy, DownloadError,
    DownloadRequest, DownloadResult, ErrorCategory, FileOperation, Result, SafeUrl,
    sanitize_error, validate_url,
};
pub use transport::{BodyStream, ResponseHead, StreamingResponse, Transport};
