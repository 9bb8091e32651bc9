//! MIME allow-list for downloaded content
//!
//! This is policy, not a security boundary: the header is whatever the server
//! sends. Executable and script types are kept out simply by not listing them.

use std::collections::HashSet;

/// Types accepted by [`ContentTypePolicy::default`]
pub const DEFAULT_CONTENT_TYPES: &[&str] = &[
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.presentation",
    "application/rtf",
    "application/epub+zip",
    // Text and structured data
    "text/plain",
    "text/csv",
    "text/markdown",
    "text/html",
    "text/xml",
    "application/json",
    "application/xml",
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    // Audio and video
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "video/mp4",
    "video/webm",
    // Archives
    "application/zip",
    "application/x-tar",
    "application/gzip",
    "application/x-gzip",
    "application/x-bzip2",
    "application/x-xz",
    "application/x-7z-compressed",
    "application/vnd.rar",
    "application/x-rar-compressed",
    // Generic binary, as sent by many static file servers
    "application/octet-stream",
];

/// Longest media type echoed back in an error
const MAX_ECHOED_LENGTH: usize = 100;

/// Set of accepted media types, compared on their lower-cased essence
#[derive(Debug, Clone)]
pub struct ContentTypePolicy {
    allowed: HashSet<String>,
}

impl ContentTypePolicy {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = types
            .into_iter()
            .map(|t| essence(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        Self { allowed }
    }

    /// A missing or empty header is accepted
    pub fn is_allowed(&self, content_type: Option<&str>) -> bool {
        match content_type.map(essence) {
            None => true,
            Some(essence) if essence.is_empty() => true,
            Some(essence) => self.allowed.contains(&essence),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl Default for ContentTypePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_TYPES)
    }
}

/// `type/subtype` without parameters, lower-cased
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Form of a server-supplied media type that is safe to put in a message
pub fn printable_essence(content_type: &str) -> String {
    essence(content_type)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '+' | '.'))
        .take(MAX_ECHOED_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_and_case_ignored() {
        let policy = ContentTypePolicy::default();
        assert!(policy.is_allowed(Some("text/plain; charset=utf-8")));
        assert!(policy.is_allowed(Some("Application/PDF")));
        assert!(policy.is_allowed(None));
        assert!(policy.is_allowed(Some("  ")));
    }

    #[test]
    fn test_printable_essence_strips_noise() {
        assert_eq!(printable_essence("application/x-sh; q=1"), "application/x-sh");
        assert_eq!(printable_essence("text/<script>"), "text/script");
    }
}
