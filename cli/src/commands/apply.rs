// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `glitchify apply` - upload an image, run the filter, optionally save the result

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use glitchify_core::domain::config::GlitchifyConfig;
use glitchify_core::domain::storage::ImageAsset;
use glitchify_core::infrastructure::storage::{create_object_store, StorageBackend};
use glitchify_sdk::{ApplyOrchestrator, DownloadOrchestrator, GlitchifyClient};

use super::download::report;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Image to filter
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Download the filtered image once it is ready
    #[arg(long)]
    pub download: bool,

    /// Where to save the download (default: client.download_dir)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

pub async fn execute(args: ApplyArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = GlitchifyConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    let backend = StorageBackend::from_config(&config.storage)
        .context("Invalid storage configuration")?;
    let store = create_object_store(backend).context("Failed to initialize object store")?;
    let client = GlitchifyClient::from_config(&config.client)
        .context("Failed to initialize filter client")?;
    debug!(api = %client.base_url(), "Filter client ready");

    let image = ImageAsset::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    println!("Applying filter to {}...", args.file.display().to_string().bold());
    let orchestrator = ApplyOrchestrator::new(store, Arc::new(client));
    let outcome = report(orchestrator.apply(Some(image)).await)?;

    println!("{}", format!("✓ {}", outcome.message).green());
    println!("  Output: {}", outcome.output_image);

    if args.download {
        let output_dir = args.output_dir.unwrap_or(config.client.download_dir.clone());
        let downloader = DownloadOrchestrator::with_timeout(output_dir, config.client.timeout())
            .context("Failed to initialize downloader")?;
        let filename = download_name(&args.file);
        let resource = report(
            downloader
                .download(orchestrator.current_result().as_deref(), Some(&filename))
                .await,
        )?;
        println!(
            "{}",
            format!("✓ Saved {} ({} bytes)", resource.path.display(), resource.size).green()
        );
    }

    Ok(())
}

/// Name the result after the input image without clobbering it.
fn download_name(input: &Path) -> String {
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image");
    format!("glitched-{}", name)
}
