//! `[watch]` section configuration.
//!
//! Which files are watched and how events are debounced.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! files = [".", "!node_modules", "!.git"]
//! debounce_ms = 300
//! ```
//!
//! Entries are paths relative to the project root; a leading `!` marks an
//! ignore pattern matched as a path-prefix against changed files.

use serde::{Deserialize, Serialize};

/// File watching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Paths to watch; `!`-prefixed entries are ignore patterns.
    pub files: Vec<String>,

    /// Quiet period after the last raw event before changes are processed.
    pub debounce_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            files: vec![
                ".".into(),
                "!node_modules".into(),
                "!.git".into(),
                "!target".into(),
            ],
            debounce_ms: 300,
        }
    }
}

impl WatchSection {
    /// Watched paths (entries without a `!` prefix).
    pub fn watch_paths(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|f| !f.starts_with('!'))
    }

    /// Ignore patterns (entries with the `!` stripped).
    pub fn ignore_patterns(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter_map(|f| f.strip_prefix('!'))
    }

    /// Whether a project-relative path falls under an ignore pattern.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.ignore_patterns().any(|pattern| {
            relative_path == pattern
                || relative_path.starts_with(&format!("{pattern}/"))
                || relative_path.contains(&format!("/{pattern}/"))
        })
    }
}
