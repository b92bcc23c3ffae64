// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Filter HTTP server bootstrap

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use glitchify_core::application::FilterRequestHandler;
use glitchify_core::domain::config::GlitchifyConfig;
use glitchify_core::infrastructure::inference::create_inference_provider;
use glitchify_core::presentation::app;

pub async fn run(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    // Load configuration
    let mut config = GlitchifyConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    // The server needs no object store, only the inference side
    if config.inference.model.trim().is_empty() {
        anyhow::bail!("inference.model must not be empty");
    }
    if config.inference.timeout_secs == 0 || config.inference.poll_interval_ms == 0 {
        anyhow::bail!("inference.timeout_secs and inference.poll_interval_ms must be greater than zero");
    }

    // One provider for the whole process
    let provider = create_inference_provider(&config.inference)
        .context("Failed to initialize inference provider")?;
    let handler = Arc::new(FilterRequestHandler::new(provider).with_model(config.inference.model.clone()));
    info!(model = %handler.model_id(), "Filter handler ready");

    let router = app(handler);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Glitchify listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
