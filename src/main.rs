//! livebundle - live development bundler for browser-loaded extensions.

mod actor;
mod agent;
mod build;
mod bundle;
mod cli;
mod config;
mod core;
mod embed;
mod identity;
mod logger;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::LiveConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    let shutdown_rx = core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = LiveConfig::load(&cli)?;

    match &cli.command {
        Commands::Dev { .. } => cli::dev::run_dev(&config, shutdown_rx),
        Commands::Release { version, .. } => cli::release::release(&config, version.as_deref()),
        Commands::Offline { .. } => cli::release::offline(&config),
        Commands::Attach { url, out } => cli::attach::run_attach(&config, url.as_deref(), out),
    }
}
