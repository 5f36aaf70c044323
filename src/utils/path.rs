//! Path normalization utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! Watched paths arrive from the watcher in whatever form the OS reports;
//! registry keys and protocol commands carry normalized, slash-separated
//! strings. These helpers are the single place both forms are produced.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Convert a path to a slash-separated string (`\` becomes `/`).
#[inline]
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render a filesystem path as a project-relative, slash-separated string.
///
/// Paths under `root` become relative (`css/site.css`); paths outside it
/// stay absolute. Either way the result uses forward slashes, so it can be
/// compared by plain string equality.
pub fn project_relative(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    normalize_slashes(&rel.to_string_lossy())
}

/// Extract the lowercase extension of a path string.
///
/// Returns an empty string when there is none.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let normalized = normalize_path(Path::new("/absolute/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_slashes() {
        assert_eq!(normalize_slashes("a\\b\\c.js"), "a/b/c.js");
        assert_eq!(normalize_slashes("a/b/c.js"), "a/b/c.js");
    }

    #[test]
    fn test_project_relative_under_root() {
        let rel = project_relative(Path::new("/proj/css/site.css"), Path::new("/proj"));
        assert_eq!(rel, "css/site.css");
    }

    #[test]
    fn test_project_relative_outside_root() {
        let rel = project_relative(Path::new("/other/site.css"), Path::new("/proj"));
        assert_eq!(rel, "/other/site.css");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a/b/main.JS"), "js");
        assert_eq!(extension_of("style.less"), "less");
        assert_eq!(extension_of("Makefile"), "");
    }
}
