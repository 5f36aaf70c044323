//! `hotline init` - write a starter config.

use std::path::Path;

use anyhow::{Result, bail};

use crate::config::CONFIG_FILE_NAME;
use crate::embed::init::CONFIG_TEMPLATE;
use crate::log;

/// Write the starter `hotline.toml` into the current directory.
pub fn init_config_file(force: bool) -> Result<()> {
    let target = Path::new(CONFIG_FILE_NAME);

    if target.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", CONFIG_FILE_NAME);
    }

    std::fs::write(target, CONFIG_TEMPLATE)?;
    log!("init"; "wrote {}", CONFIG_FILE_NAME);
    Ok(())
}
