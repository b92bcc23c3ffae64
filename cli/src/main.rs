// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Glitchify CLI
//!
//! The `glitchify` binary hosts the filter endpoint and drives it from a
//! terminal.
//!
//! ## Commands
//!
//! - `glitchify serve` - Run the filter HTTP server
//! - `glitchify apply <FILE>` - Upload an image, filter it, optionally download the result
//! - `glitchify download <URL>` - Save a filtered image locally
//! - `glitchify config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use glitchify_cli::cli::{Cli, Commands};
use glitchify_cli::{commands, server};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => server::run(cli.config, host, port).await,
        Some(Commands::Apply(args)) => commands::apply::execute(args, cli.config).await,
        Some(Commands::Download(args)) => commands::download::execute(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
