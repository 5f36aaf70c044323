//! File metadata probing.
//!
//! Builds the [`FileInfo`] payload carried by reload commands: resource
//! kind, extension, blake3 content hash, and liveness flags. Probing a
//! vanished path never fails - it degrades to `removed: true` so the
//! classifier can fall back to delete semantics.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::file_type::{FileType, TypeTable};
use crate::utils::path::extension_of;

/// Metadata of a watched file at one point in time.
///
/// `file_type` and `content_hash` are absent when the path is a directory
/// or unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    pub extension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub removed: bool,
}

impl FileInfo {
    /// Probe a path on disk, resolving `resource` (a project-relative
    /// string) against `root` for the actual filesystem access.
    pub fn probe(resource: &str, root: &Path, types: &TypeTable) -> Self {
        let extension = extension_of(resource);
        let file_type = types.lookup_path(resource);

        let full = if Path::new(resource).is_absolute() {
            Path::new(resource).to_path_buf()
        } else {
            root.join(resource)
        };

        match fs::metadata(&full) {
            Ok(meta) if meta.is_dir() => Self {
                file_type: None,
                extension,
                content_hash: None,
                is_directory: true,
                removed: false,
            },
            Ok(_) => {
                let content_hash = fs::read(&full)
                    .ok()
                    .map(|bytes| blake3::hash(&bytes).to_hex().to_string());
                // Read raced a delete: report the file as gone
                let removed = content_hash.is_none();
                Self {
                    file_type,
                    extension,
                    content_hash,
                    is_directory: false,
                    removed,
                }
            }
            Err(_) => Self {
                file_type,
                extension,
                content_hash: None,
                is_directory: false,
                removed: true,
            },
        }
    }

    /// Info for a path known to be gone (delete events skip the stat).
    pub fn removed(resource: &str, types: &TypeTable) -> Self {
        Self {
            file_type: types.lookup_path(resource),
            extension: extension_of(resource),
            content_hash: None,
            is_directory: false,
            removed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        let mut f = fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_probe_existing_file() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "app.js", "console.log(1);");

        let info = FileInfo::probe("app.js", dir.path(), &TypeTable::default());
        assert_eq!(info.file_type, Some(FileType::Script));
        assert_eq!(info.extension, "js");
        assert!(!info.removed);
        assert!(!info.is_directory);

        let expected = blake3::hash(b"console.log(1);").to_hex().to_string();
        assert_eq!(info.content_hash.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_probe_missing_file() {
        let dir = TempDir::new().unwrap();
        let info = FileInfo::probe("gone.css", dir.path(), &TypeTable::default());
        assert!(info.removed);
        assert!(info.content_hash.is_none());
        // Type is still derivable from the extension
        assert_eq!(info.file_type, Some(FileType::Style));
    }

    #[test]
    fn test_probe_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let info = FileInfo::probe("sub", dir.path(), &TypeTable::default());
        assert!(info.is_directory);
        assert!(info.file_type.is_none());
        assert!(info.content_hash.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.css", "body{}");

        let info = FileInfo::probe("a.css", dir.path(), &TypeTable::default());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "style");
        assert_eq!(json["extension"], "css");
        assert!(json["contentHash"].is_string());
        // false flags are omitted from the wire format
        assert!(json.get("removed").is_none());
        assert!(json.get("isDirectory").is_none());
    }
}
