//! hotline - live-reload development server.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod html;
mod logger;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{WatchConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Init { force } => cli::init::init_config_file(*force),
        Commands::Serve => {
            init_config(WatchConfig::load(cli)?);
            let server = cli::serve::bind_server()?;
            server.run()
        }
    }
}
