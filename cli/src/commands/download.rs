// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `glitchify download` - save a filtered image locally

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use glitchify_core::domain::config::GlitchifyConfig;
use glitchify_sdk::{DownloadOrchestrator, UserError};

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// URL of the filtered image
    #[arg(value_name = "URL")]
    pub url: String,

    /// File name to save under (default: last URL segment)
    #[arg(long)]
    pub filename: Option<String>,

    /// Directory to save into (default: client.download_dir)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

pub async fn execute(args: DownloadArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = GlitchifyConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    let output_dir = args.output_dir.unwrap_or(config.client.download_dir.clone());
    let downloader = DownloadOrchestrator::with_timeout(output_dir, config.client.timeout())
        .context("Failed to initialize downloader")?;

    let resource = report(
        downloader
            .download(Some(&args.url), args.filename.as_deref())
            .await,
    )?;

    println!(
        "{}",
        format!("✓ Saved {} ({}, {} bytes)", resource.path.display(), resource.content_type, resource.size)
            .green()
    );
    Ok(())
}

/// Print the user-facing notification for a failed action and turn it into
/// an error for the exit code.
pub(crate) fn report<T>(result: Result<T, UserError>) -> Result<T> {
    result.map_err(|e| {
        eprintln!("{}", format!("✗ {}", e.notification().message).red());
        anyhow::Error::new(e)
    })
}
