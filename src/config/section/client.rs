//! `[client]` section configuration.
//!
//! Settings for the in-browser client.
//!
//! # Example
//!
//! ```toml
//! [client]
//! log_level = "info"      # sent to clients in the init command
//! name = "hotline.js"     # URL name the bootstrap script is served under
//! ```

use serde::{Deserialize, Serialize};

/// Browser client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client-side log level, forwarded in the `init` command.
    pub log_level: String,

    /// Name the bootstrap script is served under (`/hotline.js`).
    pub name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            name: "hotline.js".into(),
        }
    }
}

impl ClientConfig {
    /// Absolute URL path of the bootstrap script.
    pub fn script_url(&self) -> String {
        format!("/{}", self.name)
    }
}
