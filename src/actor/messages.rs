//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --ReloadMsg--> ReloadActor --WsMsg--> WsActor
//! ```

use crate::reload::{FileChangeEvent, ProtocolCommand};

// =============================================================================
// ReloadActor Messages
// =============================================================================

/// Messages to the Reload Actor
#[derive(Debug)]
pub enum ReloadMsg {
    /// Debounced batch of file change events
    Changes(Vec<FileChangeEvent>),

    /// Watcher config was reloaded: reset registry/mapping state and
    /// re-announce init to all clients
    ConfigReloaded,

    /// A client reported module dependency edges
    RegisterDeps { path: String, deps: Vec<String> },

    /// A client requested a module state sync
    Sync {
        modules: Vec<String>,
        resources: Vec<String>,
    },

    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to the WebSocket Actor
pub enum WsMsg {
    /// Push a command to all connected clients
    Command(ProtocolCommand),

    /// Add client
    AddClient(std::net::TcpStream),

    /// Shutdown
    Shutdown,
}
