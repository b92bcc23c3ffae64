// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use glitchify_core::domain::config::{GlitchifyConfig, ENV_CONFIG_PATH};

const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./glitchify-config.yaml)
        #[arg(short, long, default_value = "./glitchify-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GlitchifyConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            ENV_CONFIG_PATH,
            std::env::var(ENV_CONFIG_PATH)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./glitchify-config.yaml");
        println!("  4. ~/.glitchify/config.yaml");
        println!("  5. /etc/glitchify/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!();

    println!("{}", "Inference:".bold());
    println!("  Provider: {:?}", config.inference.provider);
    println!("  Endpoint: {}", config.inference.api_base);
    println!("  Model: {}", config.inference.model);
    println!("  Token: {}", describe_secret(&config.inference.api_token));
    println!("  Timeout: {}s", config.inference.timeout_secs);
    println!();

    println!("{}", "Storage:".bold());
    println!("  Backend: {:?}", config.storage.backend);
    println!(
        "  Bucket: {}",
        config.storage.bucket.as_deref().unwrap_or("(none)")
    );
    println!();

    println!("{}", "Client:".bold());
    println!("  Environment: {:?}", config.client.environment);
    match config.client.api_base_url() {
        Ok(url) => println!("  API: {}", url),
        Err(e) => println!("  API: {}", e.to_string().red()),
    }
    println!("  Downloads: {}", config.client.download_dir.display());
    println!();

    Ok(())
}

/// Never print a literal secret.
fn describe_secret(value: &Option<String>) -> String {
    match value.as_deref() {
        None => "(none)".to_string(),
        Some(v) if v.starts_with("env:") => v.to_string(),
        Some(_) => "(set)".to_string(),
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GlitchifyConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
