//! URL safety checks against SSRF
//!
//! Every URL handed to the downloader passes through [`validate_url`] before
//! any network or disk I/O. Literal IP hosts are checked here; DNS names are
//! re-checked against the same ranges when they resolve (see
//! `backends::resolver`), so a name that later points at an internal address
//! is still refused.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use super::error::{DownloadError, Result};

/// Longest URL accepted, in characters
pub const MAX_URL_LENGTH: usize = 2048;

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Why an address range is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Private,
    LinkLocal,
    Reserved,
    Multicast,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Private => write!(f, "private network"),
            BlockReason::LinkLocal => write!(f, "link-local"),
            BlockReason::Reserved => write!(f, "reserved"),
            BlockReason::Multicast => write!(f, "multicast"),
        }
    }
}

/// A URL that passed [`validate_url`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeUrl(Url);

impl SafeUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn host_str(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Display for SafeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validate a URL for download. The first failing check wins.
pub fn validate_url(raw: &str) -> Result<SafeUrl> {
    if raw.is_empty() {
        return Err(DownloadError::InvalidUrl);
    }
    if raw.chars().count() > MAX_URL_LENGTH {
        return Err(DownloadError::UrlTooLong { max: MAX_URL_LENGTH });
    }

    let url = Url::parse(raw)?;

    // Scheme before host, so `file:///etc/passwd` reports the protocol
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(DownloadError::UnsupportedProtocol {
            scheme: url.scheme().to_string(),
        });
    }

    match url.host() {
        None => return Err(DownloadError::InvalidUrl),
        Some(Host::Domain(domain)) => check_domain(domain)?,
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip))?,
    }

    Ok(SafeUrl(url))
}

fn check_domain(domain: &str) -> Result<()> {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return Err(DownloadError::InvalidUrl);
    }
    if domain == "localhost" || domain.ends_with(".localhost") {
        return Err(DownloadError::LocalhostBlocked);
    }
    // Hosts that still look like addresses after URL normalization
    if let Ok(ip) = domain.parse::<IpAddr>() {
        return check_ip(ip);
    }
    Ok(())
}

/// Refuse loopback, private, link-local, multicast and reserved addresses
pub fn check_ip(ip: IpAddr) -> Result<()> {
    match ip {
        IpAddr::V4(v4) => check_ipv4(v4),
        IpAddr::V6(v6) => check_ipv6(v6),
    }
}

fn check_ipv4(ip: Ipv4Addr) -> Result<()> {
    let [a, b, c, _] = ip.octets();

    if ip.is_loopback() || a == 0 {
        return Err(DownloadError::LocalhostBlocked);
    }
    let reason = if ip.is_private() {
        Some(BlockReason::Private)
    } else if ip.is_link_local() {
        Some(BlockReason::LinkLocal)
    } else if ip.is_multicast() {
        Some(BlockReason::Multicast)
    } else if ip.is_broadcast()
        || ip.is_documentation()
        || a >= 240
        || (a == 100 && (64..=127).contains(&b))
        || (a == 192 && b == 0 && c == 0)
        || (a == 198 && (b == 18 || b == 19))
    {
        Some(BlockReason::Reserved)
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DownloadError::BlockedAddress { reason }),
        None => Ok(()),
    }
}

fn check_ipv6(ip: Ipv6Addr) -> Result<()> {
    if ip.is_loopback() || ip.is_unspecified() {
        return Err(DownloadError::LocalhostBlocked);
    }
    if let Some(v4) = embedded_ipv4(&ip) {
        return check_ipv4(v4);
    }

    let first = ip.segments()[0];
    let reason = if first & 0xfe00 == 0xfc00 || first & 0xffc0 == 0xfec0 {
        Some(BlockReason::Private)
    } else if first & 0xffc0 == 0xfe80 {
        Some(BlockReason::LinkLocal)
    } else if ip.is_multicast() {
        Some(BlockReason::Multicast)
    } else if first == 0x2001 && ip.segments()[1] == 0x0db8 {
        Some(BlockReason::Reserved)
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DownloadError::BlockedAddress { reason }),
        None => Ok(()),
    }
}

/// IPv4 address carried inside an IPv6 one (mapped, compatible, NAT64, 6to4)
fn embedded_ipv4(ip: &Ipv6Addr) -> Option<Ipv4Addr> {
    let s = ip.segments();
    let tail = |hi: u16, lo: u16| Ipv4Addr::new((hi >> 8) as u8, hi as u8, (lo >> 8) as u8, lo as u8);

    if let Some(v4) = ip.to_ipv4_mapped() {
        return Some(v4);
    }
    if s[..6].iter().all(|&seg| seg == 0) {
        return Some(tail(s[6], s[7]));
    }
    if s[0] == 0x0064 && s[1] == 0xff9b && s[2..6].iter().all(|&seg| seg == 0) {
        return Some(tail(s[6], s[7]));
    }
    if s[0] == 0x2002 {
        return Some(tail(s[1], s[2]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked_reason(url: &str) -> Option<BlockReason> {
        match validate_url(url) {
            Err(DownloadError::BlockedAddress { reason }) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn test_private_ranges() {
        assert_eq!(blocked_reason("http://10.0.0.1/"), Some(BlockReason::Private));
        assert_eq!(blocked_reason("http://172.16.0.1/"), Some(BlockReason::Private));
        assert_eq!(blocked_reason("http://172.31.255.255/"), Some(BlockReason::Private));
        assert_eq!(blocked_reason("http://192.168.1.1/"), Some(BlockReason::Private));
        assert_eq!(blocked_reason("http://[fd00::1]/"), Some(BlockReason::Private));

        // Just outside 172.16.0.0/12
        assert!(validate_url("http://172.32.0.1/").is_ok());
    }

    #[test]
    fn test_link_local_and_reserved() {
        assert_eq!(
            blocked_reason("http://169.254.169.254/latest/meta-data/"),
            Some(BlockReason::LinkLocal)
        );
        assert_eq!(blocked_reason("http://[fe80::1]/"), Some(BlockReason::LinkLocal));
        assert_eq!(blocked_reason("http://100.64.0.1/"), Some(BlockReason::Reserved));
        assert_eq!(blocked_reason("http://255.255.255.255/"), Some(BlockReason::Reserved));
        assert_eq!(blocked_reason("http://224.0.0.1/"), Some(BlockReason::Multicast));
    }

    #[test]
    fn test_loopback_forms() {
        for url in [
            "http://127.0.0.1/",
            "http://127.1.2.3:8080/x",
            "http://0.0.0.0/",
            "http://[::1]/",
            "http://[::]/",
            "http://[::ffff:127.0.0.1]/",
            "http://2130706433/",
            "http://0x7f.0.0.1/",
            "http://LOCALHOST/",
            "http://localhost./",
            "http://api.localhost/",
        ] {
            assert!(
                matches!(validate_url(url), Err(DownloadError::LocalhostBlocked)),
                "{} should be refused as localhost",
                url
            );
        }
    }

    #[test]
    fn test_embedded_ipv4_is_checked() {
        assert_eq!(blocked_reason("http://[::ffff:10.0.0.1]/"), Some(BlockReason::Private));
        assert_eq!(blocked_reason("http://[64:ff9b::a9fe:a9fe]/"), Some(BlockReason::LinkLocal));
        assert_eq!(blocked_reason("http://[2002:c0a8:0101::1]/"), Some(BlockReason::Private));
    }

    #[test]
    fn test_public_hosts_pass() {
        let url = validate_url("https://Example.COM/files/report.pdf?x=1").unwrap();
        assert_eq!(url.host_str(), "example.com");
        assert!(validate_url("http://93.184.216.34/file.txt").is_ok());
        assert!(validate_url("https://[2606:4700::1111]/").is_ok());
    }
}
