//! Output directory confinement
//!
//! Downloads may only land inside a fixed set of directories chosen at
//! process start. A requested directory is expanded, normalized and
//! canonicalized before it is compared, so `..` segments and symlinks cannot
//! walk out of a root.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::error::{DownloadError, Result};

/// Directories under which files may be written
#[derive(Debug, Clone, Default)]
pub struct AllowedRoots {
    roots: Vec<PathBuf>,
}

impl AllowedRoots {
    /// Build from explicit roots. Each root is canonicalized once here so that
    /// later comparisons see the same spelling as resolved request paths.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = roots
            .into_iter()
            .filter_map(|root| absolutize(root.as_ref()))
            .map(|root| canonicalize_lenient(&root))
            .collect();
        Self { roots }
    }

    /// `~/Downloads` and `~/Documents`
    pub fn user_defaults() -> Self {
        match dirs::home_dir() {
            Some(home) => Self::new([home.join("Downloads"), home.join("Documents")]),
            None => Self::default(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// True if `path` (already canonical) is a root or lies below one
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }

    /// Resolve a requested output directory to an absolute path inside the
    /// allowed roots. Nothing is created on disk.
    ///
    /// Every rejection yields the same error, whether the path is plainly
    /// outside or tries to climb out with `..`.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let expanded = expand_home(requested.trim()).ok_or(DownloadError::OutputDirNotAllowed)?;
        let absolute = absolutize(&expanded).ok_or(DownloadError::OutputDirNotAllowed)?;
        let canonical = canonicalize_lenient(&absolute);

        if !self.contains(&canonical) {
            debug!(roots = self.roots.len(), "Output directory rejected");
            return Err(DownloadError::OutputDirNotAllowed);
        }
        Ok(canonical)
    }
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }
    if path == "~" {
        return dirs::home_dir();
    }
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    Some(PathBuf::from(path))
}

/// Make absolute against the current directory and drop `.`/`..` lexically
fn absolutize(path: &Path) -> Option<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            // `pop` at the root is a no-op, so `/..` stays `/`
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor (resolving symlinks) and
/// re-append the components that do not exist yet.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_parent_segments() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_canonicalize_lenient_keeps_missing_tail() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let resolved = canonicalize_lenient(&dir.path().join("not/yet/there"));
        assert_eq!(resolved, base.join("not/yet/there"));
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~"), Some(home.clone()));
        assert_eq!(expand_home("~/Downloads/sub"), Some(home.join("Downloads/sub")));
        assert_eq!(expand_home("/tmp/x"), Some(PathBuf::from("/tmp/x")));
        assert_eq!(expand_home(""), None);
    }
}
