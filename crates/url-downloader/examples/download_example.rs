//! Example demonstrating a single guarded download
//!
//! Downloads one file into a temporary directory, then shows two requests
//! that are refused before any network traffic.
//!
//! Run this example with:
//! ```
//! cargo run --example download_example
//! ```

use std::time::Duration;
use tempfile::tempdir;
use url_downloader::{DownloadConfig, DownloadRequest, Downloader};

#[tokio::main]
async fn main() -> url_downloader::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("url_downloader=debug")),
        )
        .init();

    println!("🚀 Starting download example");

    // Only this directory may receive downloads
    let temp_dir = tempdir().map_err(url_downloader::DownloadError::from)?;
    println!("📁 Download directory: {}", temp_dir.path().display());

    let config = DownloadConfig::default().with_allowed_roots([temp_dir.path().to_path_buf()]);
    let downloader = Downloader::new(config)?;

    let request = DownloadRequest::new("https://httpbin.org/bytes/1024")
        .with_filename("test_file.bin")
        .with_timeout(Duration::from_secs(30))
        .with_max_size_mb(1);

    println!("🔄 Starting download...");
    let result = downloader.download(request).await;
    if result.success {
        println!(
            "🎉 Saved {} ({} bytes, {})",
            result.file_path.unwrap_or_default(),
            result.file_size_bytes.unwrap_or_default(),
            result.content_type.as_deref().unwrap_or("unknown type"),
        );
    } else {
        println!("❌ Download failed: {}", result.error.unwrap_or_default());
    }

    // Refused before any network traffic
    for (label, request) in [
        (
            "internal address",
            DownloadRequest::new("http://169.254.169.254/latest/meta-data"),
        ),
        (
            "outside allowed roots",
            DownloadRequest::new("https://httpbin.org/bytes/16").with_output_dir("/etc"),
        ),
    ] {
        let result = downloader.download(request).await;
        println!("🛡️  {}: {}", label, result.error.unwrap_or_default());
    }

    println!("✨ Example completed!");
    Ok(())
}
