//! `[hmr]` section configuration.
//!
//! Hot-module-reload settings. When enabled, script changes produce
//! granular module commands instead of full page reloads, and the HTML
//! injector swaps a recognized module loader for the HMR-capable one.
//!
//! # Example
//!
//! ```toml
//! [hmr]
//! enable = true
//! loader = "esl.js"             # substring identifying the loader script src
//! loader_path = "hmr-loader.js" # project path the replacement is served from
//! ```

use serde::{Deserialize, Serialize};

/// Hot-module-reload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HmrConfig {
    /// Classify script changes as module add/update/remove commands.
    pub enable: bool,

    /// Substring that identifies the module loader's `src` attribute.
    pub loader: String,

    /// Project-relative path the HMR loader is served from.
    pub loader_path: String,
}

impl Default for HmrConfig {
    fn default() -> Self {
        Self {
            enable: false,
            loader: "esl.js".into(),
            loader_path: "hmr-loader.js".into(),
        }
    }
}

impl HmrConfig {
    /// Whether a script `src` is the module loader to replace.
    pub fn is_loader(&self, src: &str) -> bool {
        !self.loader.is_empty() && src.contains(&self.loader)
    }
}
