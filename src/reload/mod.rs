//! Reload Engine
//!
//! Decides what a connected browser should do when a file changes, and
//! carries the decision to it.
//!
//! # Data flow
//!
//! ```text
//! FsActor -> ReloadActor -> WsActor -> Browser
//!  (watch)   (classify)    (broadcast)
//! ```
//!
//! # Modules
//!
//! - `classify` - change event classification and target resolution
//! - `command` - wire protocol command types
//! - `registry` - dependency registry and livereload path mapping
//! - `server` - WebSocket listener for client connections

pub mod classify;
pub mod command;
pub mod registry;
pub mod server;

pub use classify::{ChangeKind, Classifier, FileChangeEvent};
pub use command::ProtocolCommand;
pub use registry::{DependencyRegistry, LiveReloadMapping};
