//! Core types and process state.
//!
//! - `state` - serving/shutdown flags and the Ctrl+C handler
//! - `file_type` - resource kind classification from extension tables
//! - `file_info` - file metadata probing (stat + content hash)

mod file_info;
mod file_type;
mod state;

pub use file_info::FileInfo;
pub use file_type::{FileType, TypeTable};
pub use state::{is_serving, is_shutdown, register_server, set_serving, setup_shutdown_handler};
