//! reqwest-backed transport with address and redirect guards

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, header, redirect};
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::resolver::{BlockedResolution, GuardedResolver};
use crate::downloader::{
    config::DownloadConfig,
    core::{DownloadError, Result, validate_url},
    transport::{ResponseHead, StreamingResponse, Transport},
};

/// A redirect hop pointed somewhere the URL validator rejects
#[derive(Debug, Error)]
#[error("redirect target rejected: {reason}")]
pub struct BlockedRedirect {
    pub reason: String,
}

#[derive(Debug, Error)]
#[error("more than {max} redirects")]
struct TooManyRedirects {
    max: usize,
}

/// Transport that talks HTTP(S) through reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let max_redirects = config.max_redirects;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                return attempt.error(TooManyRedirects { max: max_redirects });
            }
            match validate_url(attempt.url().as_str()) {
                Ok(_) => attempt.follow(),
                Err(e) => {
                    warn!(kind = e.kind(), "Refusing redirect");
                    attempt.error(BlockedRedirect { reason: e.to_string() })
                }
            }
        });

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .no_proxy()
            .dns_resolver(Arc::new(GuardedResolver))
            .redirect(policy)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("failed to build HTTP client: {}", e),
                field: None,
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &Url, timeout: Duration) -> Result<ResponseHead> {
        debug!(host = url.host_str(), "Sending HEAD");
        let response = self
            .client
            .head(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        Ok(response_head(&response))
    }

    async fn get(&self, url: &Url, timeout: Duration) -> Result<StreamingResponse> {
        debug!(host = url.host_str(), "Sending GET");
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let head = response_head(&response);
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| classify(e, timeout)))
            .boxed();

        Ok(StreamingResponse { head, body })
    }
}

// HEAD responses carry the declared size in the header but no body, so read
// Content-Length directly rather than through `Response::content_length`.
fn response_head(response: &Response) -> ResponseHead {
    let headers = response.headers();
    ResponseHead {
        status: response.status().as_u16(),
        content_length: headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok()),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> DownloadError {
    if chain_contains::<BlockedResolution>(&error) {
        return DownloadError::ResolvedAddressBlocked;
    }
    if chain_contains::<BlockedRedirect>(&error) {
        return DownloadError::RedirectBlocked;
    }
    if error.is_timeout() {
        return DownloadError::Timeout {
            duration_secs: timeout.as_secs(),
        };
    }
    DownloadError::Network {
        source: Box::new(error),
    }
}

/// Walk the source chain, looking inside `io::Error` wrappers too
fn chain_contains<E: StdError + 'static>(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if err.is::<E>() {
            return true;
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if let Some(inner) = io.get_ref() {
                if chain_contains::<E>(inner) {
                    return true;
                }
            }
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_contains_direct_and_wrapped() {
        let blocked = BlockedResolution {
            host: "internal.example".to_string(),
        };
        assert!(chain_contains::<BlockedResolution>(&blocked));

        let wrapped = std::io::Error::other(BlockedRedirect {
            reason: "private".to_string(),
        });
        assert!(chain_contains::<BlockedRedirect>(&wrapped));
        assert!(!chain_contains::<BlockedResolution>(&wrapped));
    }
}
