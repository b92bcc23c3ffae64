// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use glitchify_core::domain::config::ENV_CONFIG_PATH;

use crate::commands::{ApplyArgs, ConfigCommand, DownloadArgs};

/// Glitchify - turn a photo into a glitched video-game portrait
#[derive(Parser, Debug)]
#[command(name = "glitchify")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = ENV_CONFIG_PATH, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GLITCHIFY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the filter HTTP server
    #[command(name = "serve")]
    Serve {
        /// Bind address (default: server.host from config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Upload an image and apply the filter
    #[command(name = "apply")]
    Apply(ApplyArgs),

    /// Download a filtered image
    #[command(name = "download")]
    Download(DownloadArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["glitchify", "serve", "--host", "0.0.0.0", "--port", "8080"])
            .unwrap();
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_apply_with_download() {
        let cli = Cli::try_parse_from([
            "glitchify",
            "--config",
            "custom.yaml",
            "apply",
            "cat.png",
            "--download",
            "--output-dir",
            "out",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Some(Commands::Apply(args)) => {
                assert_eq!(args.file, PathBuf::from("cat.png"));
                assert!(args.download);
                assert_eq!(args.output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_apply_requires_file() {
        assert!(Cli::try_parse_from(["glitchify", "apply"]).is_err());
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::try_parse_from([
            "glitchify",
            "download",
            "https://cdn/out.png",
            "--filename",
            "mine.png",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Download(args)) => {
                assert_eq!(args.url, "https://cdn/out.png");
                assert_eq!(args.filename.as_deref(), Some("mine.png"));
                assert_eq!(args.output_dir, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_generate_default_output() {
        let cli = Cli::try_parse_from(["glitchify", "config", "generate"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                command: ConfigCommand::Generate { output, examples },
            }) => {
                assert_eq!(output, PathBuf::from("./glitchify-config.yaml"));
                assert!(!examples);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
