//! File name and file handling utilities
//!
//! Name derivation, sanitization, collision-free paths and the guard that
//! removes half-written downloads.

use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use super::error::{DownloadError, FileOperation, Result};

/// Name used when nothing usable is left after sanitization
pub const DEFAULT_FILENAME: &str = "downloaded_file";

/// Longest file name produced, in bytes (the usual file system limit)
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Extension appended to names derived from a URL that have none
const FALLBACK_EXTENSION: &str = "bin";

/// How many random suffixes are tried before giving up
pub const UNIQUE_PATH_ATTEMPTS: usize = 5;

/// `_` plus eight hex digits
const SUFFIX_LENGTH: usize = 9;

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Map an arbitrary string to a file name that is legal on common file systems.
///
/// Illegal characters become `_` one for one, leading dots and surrounding
/// whitespace are stripped, and over-long names are cut in the stem so the
/// extension survives.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) || c.is_control() { '_' } else { c })
        .collect();

    let trimmed = replaced
        .trim_start_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_end();

    if trimmed.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }

    truncate_preserving_extension(trimmed, MAX_FILENAME_LENGTH)
}

fn truncate_preserving_extension(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }

    if let Some(dot) = name.rfind('.').filter(|&i| i > 0) {
        let extension = &name[dot..];
        if extension.len() < max {
            let stem = truncate_at_char_boundary(&name[..dot], max - extension.len());
            return format!("{}{}", stem, extension);
        }
    }

    truncate_at_char_boundary(name, max).trim_end().to_string()
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Derive a file name from a URL.
///
/// Uses the last path segment (percent-decoded), then the `filename` query
/// parameter. Names without an extension get `.bin`.
pub fn filename_from_url(url: &Url) -> String {
    let from_path = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(decode_segment)
        .filter(|segment| !segment.trim().is_empty());

    let name = from_path.or_else(|| {
        url.query_pairs()
            .find(|(key, _)| key == "filename")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.trim().is_empty())
    });

    let name = match name {
        Some(name) if Path::new(&name).extension().is_some() => name,
        Some(name) => format!("{}.{}", name, FALLBACK_EXTENSION),
        None => format!("{}.{}", DEFAULT_FILENAME, FALLBACK_EXTENSION),
    };

    sanitize_filename(&name)
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned(),
    }
}

/// Return `path` if it is free, otherwise a sibling `<stem>_<token><.ext>`.
///
/// This is a best effort only; the final open must still use `create_new`.
pub fn unique_path(path: &Path) -> Result<PathBuf> {
    if !is_taken(path)? {
        return Ok(path.to_path_buf());
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    // The suffixed name must stay within the same length bound as the original
    let stem_budget = MAX_FILENAME_LENGTH.saturating_sub(SUFFIX_LENGTH + extension.len());
    let stem = truncate_at_char_boundary(&stem, stem_budget);

    let mut rng = rand::rng();
    for _ in 0..UNIQUE_PATH_ATTEMPTS {
        let token: u32 = rng.random();
        let name = format!("{}_{:08x}{}", stem, token, extension);
        let candidate = parent.join(truncate_at_char_boundary(&name, MAX_FILENAME_LENGTH));
        if !is_taken(&candidate)? {
            debug!("Name collision, using {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(DownloadError::UniquePathExhausted {
        path: path.to_path_buf(),
        attempts: UNIQUE_PATH_ATTEMPTS,
    })
}

fn is_taken(path: &Path) -> Result<bool> {
    path.try_exists()
        .map_err(|e| DownloadError::file_system(path, FileOperation::Create, e))
}

/// Open a new file, failing if anything already exists at `path`
pub async fn create_new_file(path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::file_system(path, FileOperation::Create, e))
}

/// Removes the file at `path` when dropped unless [`commit`](Self::commit) was called.
///
/// Covers early returns, size aborts, timeouts and cancelled tasks alike.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path, committed: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file and hand back its path
    pub fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed partial file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove partial file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_whole_extension() {
        let name = format!("{}.tar", "x".repeat(10));
        assert_eq!(truncate_preserving_extension(&name, 8), "xxxx.tar");
    }

    #[test]
    fn test_truncate_counts_bytes_on_char_boundaries() {
        let name = format!("{}.txt", "я".repeat(10));
        let result = truncate_preserving_extension(&name, 13);
        assert_eq!(result, format!("{}.txt", "я".repeat(4)));

        assert_eq!(truncate_at_char_boundary("яя", 3), "я");
    }

    #[test]
    fn test_truncate_without_room_for_stem() {
        let name = format!("a.{}", "e".repeat(20));
        let result = truncate_preserving_extension(&name, 10);
        assert_eq!(result.chars().count(), 10);
        assert!(result.starts_with("a."));
    }

    #[test]
    fn test_partial_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");
        std::fs::write(&path, b"half").unwrap();

        drop(PartialFile::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file_kept_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.bin");
        std::fs::write(&path, b"all").unwrap();

        let kept = PartialFile::new(path.clone()).commit();
        assert_eq!(kept, path);
        assert!(path.exists());
    }
}
