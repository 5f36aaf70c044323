//! File type classification.
//!
//! Maps a path's extension to the reload-relevant resource kind via the
//! config-driven extension tables in `[types]`.

use serde::{Deserialize, Serialize};

/// Resource kind of a watched file, as far as reload behavior is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// JavaScript modules (hot-swappable when HMR is on)
    Script,
    /// Stylesheets and style preprocessor sources
    Style,
    /// Images referenced from pages
    Image,
    /// HTML and template markup
    Markup,
}

/// Extension tables mapping file extensions to a [`FileType`].
///
/// Configured under `[types]`; extensions are comma-separated in the config
/// file and matched case-insensitively. First table that lists the extension
/// wins, checked in Script, Style, Image, Markup order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeTable {
    pub script: String,
    pub style: String,
    pub image: String,
    pub markup: String,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self {
            script: "js,mjs".into(),
            style: "css,less,sass,scss,styl".into(),
            image: "png,jpg,jpeg,gif,webp,svg,ico".into(),
            markup: "html,htm".into(),
        }
    }
}

impl TypeTable {
    /// Look up the file type for an extension (without dot, any case).
    pub fn lookup(&self, extension: &str) -> Option<FileType> {
        let ext = extension.to_ascii_lowercase();
        let listed = |table: &str| table.split(',').any(|e| e.trim() == ext);

        if listed(&self.script) {
            Some(FileType::Script)
        } else if listed(&self.style) {
            Some(FileType::Style)
        } else if listed(&self.image) {
            Some(FileType::Image)
        } else if listed(&self.markup) {
            Some(FileType::Markup)
        } else {
            None
        }
    }

    /// Look up the file type for a path string.
    pub fn lookup_path(&self, path: &str) -> Option<FileType> {
        let ext = crate::utils::path::extension_of(path);
        if ext.is_empty() {
            return None;
        }
        self.lookup(&ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = TypeTable::default();
        assert_eq!(table.lookup("js"), Some(FileType::Script));
        assert_eq!(table.lookup("less"), Some(FileType::Style));
        assert_eq!(table.lookup("PNG"), Some(FileType::Image));
        assert_eq!(table.lookup("html"), Some(FileType::Markup));
        assert_eq!(table.lookup("rs"), None);
    }

    #[test]
    fn test_lookup_path() {
        let table = TypeTable::default();
        assert_eq!(table.lookup_path("src/app.js"), Some(FileType::Script));
        assert_eq!(table.lookup_path("css/site.scss"), Some(FileType::Style));
        assert_eq!(table.lookup_path("README"), None);
    }

    #[test]
    fn test_custom_table_with_spaces() {
        let table = TypeTable {
            style: "css, wxss".into(),
            ..TypeTable::default()
        };
        assert_eq!(table.lookup("wxss"), Some(FileType::Style));
    }
}
