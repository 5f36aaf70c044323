//! Actor System for Live Reload
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> ReloadActor --> WsActor
//! (watch)     (classify)    (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `reload` - Change classification against registry and mapping
//! - `ws` - WebSocket client management and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod reload;
pub mod ws;

pub use coordinator::Coordinator;
