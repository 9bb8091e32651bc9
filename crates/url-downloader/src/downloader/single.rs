//! Single-file download pipeline
//!
//! validate URL → pick a name → resolve the directory → HEAD → streaming GET
//! → write under a fresh name. Every step either passes or produces a failed
//! [`DownloadResult`]; nothing here returns an error to the caller.

use futures::StreamExt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{Span, debug, info, instrument, warn};
use url::Url;

use crate::downloader::{
    config::DownloadConfig,
    core::{
        DownloadError, DownloadRequest, DownloadResult, FileOperation, Result, SafeUrl,
        content_type::printable_essence,
        files::{PartialFile, create_new_file},
        filename_from_url, sanitize_filename, unique_path, validate_url,
    },
    transport::Transport,
};

/// Run one download to completion and report the outcome
#[instrument(skip_all, fields(host = tracing::field::Empty))]
pub async fn download_one(
    transport: &dyn Transport,
    config: &DownloadConfig,
    request: &DownloadRequest,
) -> DownloadResult {
    let url = match validate_url(&request.url) {
        Ok(url) => url,
        Err(e) => {
            warn!(kind = e.kind(), "URL rejected");
            return DownloadResult::failed(None, &e);
        }
    };
    Span::current().record("host", url.host_str());

    let file_name = match request.filename.as_deref() {
        Some(name) => sanitize_filename(name),
        None => filename_from_url(url.as_url()),
    };

    match fetch(transport, config, request, &url, &file_name).await {
        Ok((path, size, content_type)) => {
            info!(size, "Download complete");
            DownloadResult::succeeded(&path, size, content_type)
        }
        Err(e) => {
            warn!(kind = e.kind(), "Download failed");
            DownloadResult::failed(Some(file_name), &e)
        }
    }
}

async fn fetch(
    transport: &dyn Transport,
    config: &DownloadConfig,
    request: &DownloadRequest,
    url: &SafeUrl,
    file_name: &str,
) -> Result<(PathBuf, u64, Option<String>)> {
    let output_dir = match request.output_dir.as_deref() {
        Some(dir) => config.allowed_roots.resolve(dir)?,
        None => config
            .allowed_roots
            .resolve(&config.default_output_dir.to_string_lossy())?,
    };
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| DownloadError::file_system(&output_dir, FileOperation::CreateDir, e))?;

    let target = output_dir.join(file_name);
    let transfer = transfer(transport, config, request, url.as_url(), target);

    match tokio::time::timeout(request.timeout, transfer).await {
        Ok(result) => result,
        // Dropping the transfer future drops its PartialFile, removing the file
        Err(_) => Err(DownloadError::Timeout {
            duration_secs: request.timeout.as_secs(),
        }),
    }
}

async fn transfer(
    transport: &dyn Transport,
    config: &DownloadConfig,
    request: &DownloadRequest,
    url: &Url,
    target: PathBuf,
) -> Result<(PathBuf, u64, Option<String>)> {
    let limit = request.max_size_bytes;

    match transport.head(url, request.timeout).await {
        Ok(head) => {
            if let Some(size) = head.content_length.filter(|size| *size > limit) {
                debug!(size, limit, "Declared size over limit, skipping GET");
                return Err(DownloadError::FileTooLarge {
                    size: Some(size),
                    limit_bytes: limit,
                });
            }
        }
        Err(e @ (DownloadError::ResolvedAddressBlocked | DownloadError::RedirectBlocked)) => {
            return Err(e);
        }
        Err(e) => debug!(kind = e.kind(), "HEAD failed, continuing with GET"),
    }

    let response = transport.get(url, request.timeout).await?;
    if !response.head.is_success() {
        return Err(DownloadError::HttpStatus {
            status: response.head.status,
        });
    }
    if let Some(size) = response.head.content_length.filter(|size| *size > limit) {
        return Err(DownloadError::FileTooLarge {
            size: Some(size),
            limit_bytes: limit,
        });
    }

    let content_type = response.head.content_type.clone();
    if !config.content_types.is_allowed(content_type.as_deref()) {
        return Err(DownloadError::ContentTypeNotAllowed {
            content_type: content_type.as_deref().map(printable_essence).unwrap_or_default(),
        });
    }

    let path = unique_path(&target)?;
    let file = create_new_file(&path).await?;
    let partial = PartialFile::new(path);
    // Rebound after the guard so the handle closes before the file is removed
    let mut file = file;

    let mut body = response.body;
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        if written > limit {
            debug!(written, limit, "Body exceeded limit, aborting");
            return Err(DownloadError::FileTooLarge {
                size: None,
                limit_bytes: limit,
            });
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::file_system(partial.path(), FileOperation::Write, e))?;
    }
    file.flush()
        .await
        .map_err(|e| DownloadError::file_system(partial.path(), FileOperation::Write, e))?;
    drop(file);

    Ok((partial.commit(), written, content_type))
}
