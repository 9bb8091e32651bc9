//! DNS resolution with address re-validation
//!
//! A host name that passed URL validation can still resolve to an internal
//! address, or change its answer between check and connect. Hooking the
//! check into the client's own resolver means the addresses we vet are the
//! addresses reqwest dials.

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::downloader::core::check_ip;

/// Every address a host resolved to is in a blocked range
#[derive(Debug, Error)]
#[error("all addresses resolved for '{host}' are blocked")]
pub struct BlockedResolution {
    pub host: String,
}

/// reqwest resolver that drops blocked addresses and fails if none remain
#[derive(Debug, Default, Clone, Copy)]
pub struct GuardedResolver;

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = resolve_allowed(&host).await?;
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Resolve `host` and keep only addresses that pass [`check_ip`]
pub async fn resolve_allowed(
    host: &str,
) -> std::result::Result<Vec<SocketAddr>, Box<dyn std::error::Error + Send + Sync>> {
    let resolved: Vec<SocketAddr> = tokio::net::lookup_host((host, 0)).await?.collect();
    Ok(filter_allowed(host, resolved)?)
}

/// Drop blocked addresses from a resolution, failing if nothing is left
pub fn filter_allowed(
    host: &str,
    resolved: Vec<SocketAddr>,
) -> std::result::Result<Vec<SocketAddr>, BlockedResolution> {
    let total = resolved.len();
    let allowed: Vec<SocketAddr> = resolved
        .into_iter()
        .filter(|addr| check_ip(addr.ip()).is_ok())
        .collect();

    if allowed.is_empty() {
        warn!(host, total, "Refusing host that resolves only to blocked addresses");
        return Err(BlockedResolution { host: host.to_string() });
    }
    if allowed.len() < total {
        debug!(host, dropped = total - allowed.len(), "Dropped blocked addresses from resolution");
    }
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(ips: &[&str]) -> Vec<SocketAddr> {
        ips.iter()
            .map(|ip| SocketAddr::new(ip.parse().unwrap(), 0))
            .collect()
    }

    #[test]
    fn test_mixed_resolution_keeps_only_public_addresses() {
        let resolved = addrs(&["10.0.0.5", "93.184.216.34", "169.254.169.254", "2606:4700::1111", "fd00::1"]);
        let allowed = filter_allowed("mixed.example.com", resolved).unwrap();
        assert_eq!(allowed, addrs(&["93.184.216.34", "2606:4700::1111"]));
    }

    #[test]
    fn test_resolution_to_only_blocked_addresses_fails() {
        let resolved = addrs(&["10.1.2.3", "169.254.169.254", "127.0.0.1", "::ffff:192.168.1.1"]);
        let err = filter_allowed("internal.example.com", resolved).unwrap_err();
        assert_eq!(err.host, "internal.example.com");
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn test_public_resolution_passes_unchanged() {
        let resolved = addrs(&["93.184.216.34", "8.8.8.8"]);
        assert_eq!(filter_allowed("example.com", resolved.clone()).unwrap(), resolved);
    }

    #[test]
    fn test_empty_resolution_fails() {
        assert!(filter_allowed("nothing.example.com", Vec::new()).is_err());
    }
}
