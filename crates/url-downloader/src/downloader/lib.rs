//! Main entry point for the downloader
//!
//! The call chain flows as follows:
//!
//! User Code
//! ↓
//! Downloader (this file)
//! ↓
//! download_batch (batch/mod.rs) / download_one (single.rs)
//! ↓
//! HttpTransport (backends/http.rs)
//! ↓
//! Core checks (core/*)

use crate::downloader::{
    backends::HttpTransport,
    batch::download_batch,
    config::DownloadConfig,
    core::{BatchOptions, BatchResult, DownloadRequest, DownloadResult, Result},
    single::download_one,
    transport::Transport,
};
use std::sync::Arc;
use tracing::warn;

/// Downloader bound to one configuration and transport
///
/// Cheap to clone; clones share the HTTP client and configuration.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
    config: Arc<DownloadConfig>,
}

impl Downloader {
    /// Create a downloader using the reqwest transport
    pub fn new(config: DownloadConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a downloader over a custom transport
    pub fn with_transport(config: DownloadConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download a single file
    ///
    /// Never fails; problems are reported in the returned result.
    pub async fn download(&self, request: DownloadRequest) -> DownloadResult {
        if let Err(e) = self.config.check_request(&request) {
            warn!(kind = e.kind(), "Request rejected");
            return DownloadResult::failed(None, &e);
        }
        download_one(self.transport.as_ref(), &self.config, &request).await
    }

    /// Download many files concurrently with shared options
    pub async fn download_all(&self, urls: Vec<String>, options: BatchOptions) -> Result<BatchResult> {
        download_batch(
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
            urls,
            options,
        )
        .await
    }
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
