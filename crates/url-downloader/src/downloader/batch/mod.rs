//! Batch download operations
//!
//! Each URL runs the single-file pipeline in its own task. A semaphore local
//! to the call caps how many transfers are in flight; results come back in
//! input order no matter which finished first.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info, instrument, warn};

use crate::downloader::{
    config::DownloadConfig,
    core::{BatchOptions, BatchResult, DownloadError, DownloadResult, Result},
    single::download_one,
    transport::Transport,
};

/// Download every URL in `urls` with the same options
///
/// Fails as a whole only for a batch that is too large or options out of
/// bounds; per-URL problems land in the matching [`DownloadResult`].
/// Dropping the returned future cancels the transfers still in flight.
#[instrument(skip_all, fields(urls = urls.len()))]
pub async fn download_batch(
    transport: Arc<dyn Transport>,
    config: Arc<DownloadConfig>,
    urls: Vec<String>,
    options: BatchOptions,
) -> Result<BatchResult> {
    if urls.len() > config.max_batch_urls {
        return Err(DownloadError::TooManyUrls {
            max: config.max_batch_urls,
            actual: urls.len(),
        });
    }
    if urls.is_empty() {
        return Ok(BatchResult::default());
    }
    config.check_batch_options(&options)?;

    let max_concurrent = config.max_concurrent_downloads.max(1);
    debug!(max_concurrent, "Starting batch");
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let batch_span = Span::current();

    let handles: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let request = options.request_for(url);
            let transport = Arc::clone(&transport);
            let config = Arc::clone(&config);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(
                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return DownloadResult::failed(
                                None,
                                &DownloadError::Internal("batch semaphore closed".to_string()),
                            );
                        }
                    };
                    download_one(transport.as_ref(), &config, &request).await
                }
                .instrument(batch_span.clone()),
            )
        })
        .collect();
    let mut tasks = BatchTasks(handles);

    let mut results = Vec::with_capacity(tasks.0.len());
    for handle in tasks.0.iter_mut() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Download task did not complete: {}", e);
                DownloadResult::failed(None, &DownloadError::Internal(e.to_string()))
            }
        };
        results.push(result);
    }

    let batch = BatchResult::from_results(results);
    info!(
        succeeded = batch.success_count,
        failed = batch.failed_count,
        "Batch complete"
    );
    Ok(batch)
}

/// Aborts every task still running if the batch is dropped before it completes
struct BatchTasks(Vec<JoinHandle<DownloadResult>>);

impl Drop for BatchTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
