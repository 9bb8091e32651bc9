//! Example demonstrating batch downloads
//!
//! Several URLs are fetched concurrently with shared options. Results come
//! back in input order, failures included.
//!
//! Run this example with:
//! ```
//! cargo run --example batch_download_example
//! ```

use std::time::Duration;
use tempfile::tempdir;
use tokio::time::Instant;
use url_downloader::{BatchOptions, DownloadConfig, Downloader};

#[tokio::main]
async fn main() -> url_downloader::Result<()> {
    tracing_subscriber::fmt::init();

    println!("🚀 Starting batch download example");

    let temp_dir = tempdir().map_err(url_downloader::DownloadError::from)?;
    println!("📁 Download directory: {}", temp_dir.path().display());

    let config = DownloadConfig::default()
        .with_allowed_roots([temp_dir.path().to_path_buf()])
        .with_max_concurrent_downloads(3);
    let downloader = Downloader::new(config)?;

    let urls = vec![
        "https://httpbin.org/bytes/1024".to_string(),
        "https://httpbin.org/bytes/10240".to_string(),
        "https://httpbin.org/status/404".to_string(),
        "http://192.168.0.1/router.cfg".to_string(),
        "https://httpbin.org/image/png".to_string(),
    ];

    let options = BatchOptions::default()
        .with_output_dir(temp_dir.path().join("batch").display().to_string())
        .with_timeout(Duration::from_secs(30))
        .with_max_size_mb(5);

    let start = Instant::now();
    let batch = downloader.download_all(urls.clone(), options).await?;
    let elapsed = start.elapsed();

    println!("\n📊 Batch finished in {:.2}s", elapsed.as_secs_f64());
    for (url, result) in urls.iter().zip(&batch.results) {
        if result.success {
            println!(
                "  ✅ {} → {} ({} bytes)",
                url,
                result.file_name.as_deref().unwrap_or("?"),
                result.file_size_bytes.unwrap_or_default()
            );
        } else {
            println!("  ❌ {} → {}", url, result.error.as_deref().unwrap_or("unknown error"));
        }
    }
    println!(
        "\n{} succeeded, {} failed",
        batch.success_count, batch.failed_count
    );

    Ok(())
}
