//! URL Downloader Library
//!
//! Fetches files from user-supplied HTTP(S) URLs into a confined set of
//! directories. Every request is checked before any I/O: the URL may not point
//! at loopback, private or otherwise internal addresses (DNS answers and
//! redirect hops are checked again at connect time), the output directory must
//! sit inside the allowed roots, and size and content-type limits are enforced
//! while streaming. Existing files are never overwritten.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use url_downloader::{BatchOptions, DownloadConfig, DownloadRequest, Downloader};
//! use std::time::Duration;
//!
//! # async fn example() -> url_downloader::Result<()> {
//! // Downloads may only land under ~/Downloads and ~/Documents
//! let downloader = Downloader::new(DownloadConfig::default())?;
//!
//! let request = DownloadRequest::new("https://example.com/report.pdf")
//!     .with_output_dir("~/Downloads/reports")
//!     .with_timeout(Duration::from_secs(30))
//!     .with_max_size_mb(50);
//!
//! let result = downloader.download(request).await;
//! if result.success {
//!     println!("Saved to {:?}", result.file_path);
//! } else {
//!     println!("Failed: {:?}", result.error);
//! }
//!
//! // Several files at once, results in input order
//! let batch = downloader
//!     .download_all(
//!         vec![
//!             "https://example.com/a.csv".to_string(),
//!             "https://example.com/b.csv".to_string(),
//!         ],
//!         BatchOptions::default(),
//!     )
//!     .await?;
//! println!("{} ok, {} failed", batch.success_count, batch.failed_count);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **SSRF protection**: scheme, host and address checks, re-run on DNS and redirects
//! - **Directory confinement**: `~` expansion, `..` and symlink escapes rejected
//! - **Streaming limits**: declared and actual size both capped, partial files removed
//! - **Content-type allow-list**: configurable media types
//! - **Batch downloads**: bounded concurrency, per-item results
//! - **Safe errors**: messages never carry paths or library internals

pub mod downloader;

// Re-export commonly used types for convenience
pub use downloader::{
    AllowedRoots, BatchOptions, BatchResult, ContentTypePolicy, DownloadConfig, DownloadError,
    DownloadRequest, DownloadResult, Downloader, HttpTransport, Result, Transport,
};
