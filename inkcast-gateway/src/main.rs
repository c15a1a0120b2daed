//! Inkcast - E-ink Tag Image Gateway
//!
//! Runs on a Linux single board computer with an A7106 transceiver wired to
//! its GPIO header. Tags wake up, send a hello listing the chunks of the
//! image they still miss, and receive exactly one chunk per wake-up.
//!
//! Besides serving, the binary carries the radio diagnostics (register dump,
//! listen and beacon modes) and the address selection tool.

mod cli;
mod commands;
mod config;
mod error;
mod feed;
mod radio;

use clap::Parser;

use crate::cli::Cli;
use crate::config::GatewayConfig;
use crate::error::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = GatewayConfig::load_or_default(&cli.config)?;

    // Initialize logger; RUST_LOG overrides the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if cli.config.exists() {
        log::debug!("Using config: {}", cli.config.display());
    } else {
        log::info!("{} not found, using defaults", cli.config.display());
    }

    cli::run(cli.command, &config)
}
