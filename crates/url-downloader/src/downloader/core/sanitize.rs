//! Turning errors into caller-safe messages
//!
//! Nothing that leaves the crate may carry a file system path, a response
//! body, or library-specific error text.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{DownloadError, ErrorCategory};

/// Placeholder substituted for anything that looks like a path
pub const PATH_PLACEHOLDER: &str = "[PATH]";

const GENERIC_FAILURE: &str = "Download failed";
const NETWORK_FAILURE: &str = "Network error";
const TIMEOUT_FAILURE: &str = "Request timeout";

// Unix paths must start a word so `and/or` or `text/plain` survive
static UNIX_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?P<lead>^|[\s"'`(\[=,;])/[^\s"'`)\],;]+"#).expect("valid regex"));

static WINDOWS_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:\b[A-Za-z]:[\\/]|\\\\)[^\s"'`)\],;]*"#).expect("valid regex"));

/// Replace Unix (`/home/x`) and Windows (`C:\Users\x`, `\\server\share`)
/// path-like substrings with [`PATH_PLACEHOLDER`]
pub fn redact_paths(message: &str) -> String {
    let unix = UNIX_PATH.replace_all(message, format!("${{lead}}{}", PATH_PLACEHOLDER).as_str());
    WINDOWS_PATH.replace_all(&unix, PATH_PLACEHOLDER).into_owned()
}

/// Produce the message shown to the caller for `err`.
///
/// Validation errors pass through (minus any paths); transfer errors map to a
/// fixed phrase per kind; everything else becomes "Download failed".
pub fn sanitize_error(err: &DownloadError) -> String {
    match err {
        DownloadError::Timeout { .. } => TIMEOUT_FAILURE.to_string(),
        DownloadError::Network { .. } => NETWORK_FAILURE.to_string(),
        DownloadError::HttpStatus { status } => format!("HTTP error: {}", status),
        DownloadError::FileTooLarge { .. } => redact_paths(&err.to_string()),
        _ => match err.category() {
            ErrorCategory::Validation => redact_paths(&err.to_string()),
            ErrorCategory::Transfer | ErrorCategory::Internal => GENERIC_FAILURE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_keeps_plain_text() {
        assert_eq!(redact_paths("Invalid URL format"), "Invalid URL format");
        assert_eq!(redact_paths("this and/or that"), "this and/or that");
        assert_eq!(
            redact_paths("Content type 'application/x-sh' is not allowed"),
            "Content type 'application/x-sh' is not allowed"
        );
    }

    #[test]
    fn test_redact_multiple_paths() {
        let redacted = redact_paths("copy /tmp/a.txt to \"/var/lib/b\" failed (D:/data/c)");
        assert_eq!(redacted, "copy [PATH] to \"[PATH]\" failed ([PATH])");
    }

    #[test]
    fn test_redact_unc_path() {
        let redacted = redact_paths(r"cannot open \\fileserver\share\secret.doc");
        assert_eq!(redacted, "cannot open [PATH]");
    }
}
