//! HTML scanning and rewriting.
//!
//! - `scanner` - combined-regex scanners for script/link/style elements
//! - `inject` - snippet injection with append/prepend/replace placements

pub mod inject;
pub mod scanner;

pub use inject::{Placement, SnippetKind, inject};
pub use scanner::{TagKind, TagMatch};
