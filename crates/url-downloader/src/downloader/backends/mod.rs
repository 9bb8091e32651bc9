//! Backend transport implementations
//!
//! This module contains the network side of the [`Transport`] trait.
//! Currently supported:
//! - HTTP/HTTPS through reqwest, with DNS and redirect targets re-validated
//!
//! [`Transport`]: crate::downloader::transport::Transport

pub mod http;
pub mod resolver;

// Re-export main implementations
pub use http::{BlockedRedirect, HttpTransport};
pub use resolver::{BlockedResolution, GuardedResolver};
