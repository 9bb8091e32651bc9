//! HTTP transport seam
//!
//! The pipeline only needs two calls from the network: a HEAD for the
//! declared size and a streaming GET. Keeping them behind a trait lets tests
//! and embedders supply their own client.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::time::Duration;
use url::Url;

use crate::downloader::core::Result;

/// Status line and the headers the pipeline looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body chunks as they arrive
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// A GET response whose body has not been read yet
pub struct StreamingResponse {
    pub head: ResponseHead,
    pub body: BodyStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

/// Network access used by the downloader
///
/// Implementations must apply `timeout` to the whole call (for `get`,
/// including reading the body) and must refuse to connect to addresses that
/// fail [`check_ip`](crate::downloader::core::check_ip).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn head(&self, url: &Url, timeout: Duration) -> Result<ResponseHead>;

    async fn get(&self, url: &Url, timeout: Duration) -> Result<StreamingResponse>;
}
