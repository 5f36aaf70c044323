//! Reload Command Protocol
//!
//! Defines the JSON message format for WebSocket communication between
//! the development server and browser clients.
//!
//! # Command Types
//!
//! - `init`: Handshake carrying log level and HMR flag
//! - `reloadPage`: Trigger full page reload
//! - `reloadCSS`: Swap a stylesheet in place (no layout flash)
//! - `reloadImage`: Refresh an image
//! - `addModule` / `updateModule` / `removeModule`: HMR module lifecycle
//! - `syncModule`: Bulk module state answer to a client sync request

use serde::{Deserialize, Serialize};

use crate::core::FileInfo;

/// Command sent over the WebSocket to connected clients.
///
/// Immutable once constructed. Paths are normalized the same way registry
/// keys are, so client-side membership checks are exact-string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolCommand {
    /// Client handshake: log level and whether HMR is active
    #[serde(rename = "init")]
    Init {
        #[serde(rename = "logLevel")]
        log_level: String,
        hmr: bool,
    },

    /// Full page reload
    #[serde(rename = "reloadPage")]
    ReloadPage { path: String },

    /// Stylesheet swap
    #[serde(rename = "reloadCSS")]
    ReloadStyle {
        path: String,
        #[serde(rename = "fileInfo")]
        info: FileInfo,
    },

    /// Image refresh
    #[serde(rename = "reloadImage")]
    ReloadImage {
        path: String,
        #[serde(rename = "fileInfo")]
        info: FileInfo,
    },

    /// A new script module appeared
    #[serde(rename = "addModule")]
    AddModule { path: String },

    /// An existing script module changed
    #[serde(rename = "updateModule")]
    UpdateModule {
        path: String,
        #[serde(rename = "fileInfo")]
        info: FileInfo,
    },

    /// A script module was deleted
    #[serde(rename = "removeModule")]
    RemoveModule { path: String },

    /// Bulk module state for a client that requested a sync
    #[serde(rename = "syncModule")]
    SyncModules {
        modules: Vec<FileInfo>,
        resources: Vec<FileInfo>,
    },
}

impl ProtocolCommand {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reloadPage"}"#.to_string())
    }

    /// Parse from a JSON text frame.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }

    /// The resource path this command targets, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ReloadPage { path }
            | Self::ReloadStyle { path, .. }
            | Self::ReloadImage { path, .. }
            | Self::AddModule { path }
            | Self::UpdateModule { path, .. }
            | Self::RemoveModule { path } => Some(path),
            Self::Init { .. } | Self::SyncModules { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TypeTable;

    #[test]
    fn test_init_serialization() {
        let cmd = ProtocolCommand::Init {
            log_level: "info".into(),
            hmr: false,
        };
        let json = cmd.to_json();
        assert!(json.contains(r#""type":"init""#));
        assert!(json.contains(r#""logLevel":"info""#));
        assert!(json.contains(r#""hmr":false"#));
    }

    #[test]
    fn test_reload_css_wire_name() {
        let info = FileInfo::removed("css/site.css", &TypeTable::default());
        let cmd = ProtocolCommand::ReloadStyle {
            path: "css/site.css".into(),
            info,
        };
        let json = cmd.to_json();
        assert!(json.contains(r#""type":"reloadCSS""#));
        assert!(json.contains(r#""path":"css/site.css""#));
        assert!(json.contains(r#""fileInfo""#));
    }

    #[test]
    fn test_round_trip() {
        let cmd = ProtocolCommand::ReloadPage {
            path: "index.html".into(),
        };
        let parsed = ProtocolCommand::from_json(&cmd.to_json()).unwrap();
        match parsed {
            ProtocolCommand::ReloadPage { path } => assert_eq!(path, "index.html"),
            other => panic!("expected reloadPage, got {other:?}"),
        }
    }

    #[test]
    fn test_module_commands() {
        let add = ProtocolCommand::AddModule {
            path: "src/mod.js".into(),
        };
        assert!(add.to_json().contains(r#""type":"addModule""#));
        assert_eq!(add.path(), Some("src/mod.js"));

        let sync = ProtocolCommand::SyncModules {
            modules: vec![],
            resources: vec![],
        };
        assert!(sync.to_json().contains(r#""type":"syncModule""#));
        assert_eq!(sync.path(), None);
    }
}
