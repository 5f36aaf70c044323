//! Configuration management for `hotline.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── serve      # [serve]
//! │   ├── watch      # [watch]
//! │   ├── hmr        # [hmr]
//! │   ├── client     # [client]
//! │   └── livereload # [[livereload]] mapping rules
//! ├── handle         # Global arc-swap handle (cfg / init / reload)
//! └── mod.rs         # WatchConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section          | Purpose                                         |
//! |------------------|-------------------------------------------------|
//! | `[serve]`        | HTTP server (interface, port, served root)      |
//! | `[watch]`        | Watched paths, ignore patterns, debounce        |
//! | `[types]`        | File extension tables per resource kind         |
//! | `[[livereload]]` | Changed-path to reload-target mapping rules     |
//! | `[hmr]`          | Hot-module-reload loader settings               |
//! | `[client]`       | Browser client (log level, script name)         |

mod handle;
pub mod section;

pub use handle::{cfg, init_config, reload_config};
pub use section::{
    ClientConfig, HmrConfig, LiveReloadRule, ServeConfig, TargetList, WatchSection, build_mapping,
};

use crate::cli::Cli;
use crate::core::TypeTable;
use crate::utils::path::normalize_path;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "hotline.toml";

/// Errors loading `hotline.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing hotline.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// HTTP server settings
    pub serve: ServeConfig,

    /// File watching settings
    pub watch: WatchSection,

    /// File extension tables per resource kind
    pub types: TypeTable,

    /// Ordered livereload mapping rules
    pub livereload: Vec<LiveReloadRule>,

    /// Hot-module-reload settings
    pub hmr: HmrConfig,

    /// Browser client settings
    pub client: ClientConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            cli: None,
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            serve: ServeConfig::default(),
            watch: WatchSection::default(),
            types: TypeTable::default(),
            livereload: Vec::new(),
            hmr: HmrConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// A missing config file is not an error: built-in defaults apply, and
    /// the miss is logged only when the user explicitly passed `--config`.
    pub fn load(cli: &'static Cli) -> Result<Self, ConfigError> {
        let (config_path, explicit) = match &cli.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(CONFIG_FILE_NAME), false),
        };
        let config_path = normalize_path(&config_path);

        let mut config = if config_path.is_file() {
            Self::parse_file(&config_path)?
        } else {
            if explicit {
                crate::log!("config"; "config file not found: {}, using defaults",
                    config_path.display());
            }
            Self::default()
        };

        config.cli = Some(cli);
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| normalize_path(Path::new(".")));
        config.config_path = config_path;

        // CLI flags override file values
        if let Some(port) = cli.port {
            config.serve.port = port;
        }

        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Directory served over HTTP (serve.root resolved against the project root).
    pub fn serve_root(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.serve.root))
    }
}

/// Parse a config snippet in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> WatchConfig {
    toml::from_str(content).expect("test config should parse")
}
