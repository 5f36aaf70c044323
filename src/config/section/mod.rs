//! Configuration section definitions.

mod client;
mod hmr;
mod livereload;
mod serve;
mod watch;

pub use client::ClientConfig;
pub use hmr::HmrConfig;
pub use livereload::{LiveReloadRule, TargetList, build_mapping};
pub use serve::ServeConfig;
pub use watch::WatchSection;
