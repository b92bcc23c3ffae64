// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Result Download Orchestrator
//!
//! Fetches the filtered image and materializes it in a local directory. The
//! bytes land in a temporary file next to the target first and are then
//! renamed into place, so a half-written result is never visible under its
//! final name.

use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use glitchify_core::domain::storage::ImageAsset;

use crate::error::{UserError, MSG_NOTHING_TO_DOWNLOAD};
use crate::state::{BusyGuard, DownloadPhase, PhaseRollback, PhaseTracker};

const DEFAULT_FILENAME: &str = "glitchify-output";

/// A downloaded result on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalResource {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

pub struct DownloadOrchestrator {
    http: Client,
    output_dir: PathBuf,
    busy: AtomicBool,
    phase: PhaseTracker<DownloadPhase>,
}

impl DownloadOrchestrator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(Client::new(), output_dir)
    }

    pub fn with_timeout(output_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, UserError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UserError::Network(e.to_string()))?;
        Ok(Self::with_client(http, output_dir))
    }

    pub fn with_client(http: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            output_dir: output_dir.into(),
            busy: AtomicBool::new(false),
            phase: PhaseTracker::new(DownloadPhase::Idle, DownloadPhase::can_transition_to),
        }
    }

    pub fn phase(&self) -> DownloadPhase {
        self.phase.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadPhase> {
        self.phase.subscribe()
    }

    /// Download `output` into the output directory.
    ///
    /// `suggested_filename` is sanitized before use; without one the last
    /// path segment of the URL is used.
    pub async fn download(
        &self,
        output: Option<&str>,
        suggested_filename: Option<&str>,
    ) -> Result<LocalResource, UserError> {
        let Some(url) = output.map(str::trim).filter(|url| !url.is_empty()) else {
            return Err(UserError::validation(MSG_NOTHING_TO_DOWNLOAD));
        };
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("Download rejected: another download is in flight");
            return Err(UserError::Busy);
        };

        // A finished download stays on display until the next one succeeds
        let prior = match self.phase.current() {
            DownloadPhase::Ready => DownloadPhase::Ready,
            _ => DownloadPhase::Idle,
        };
        self.phase.restore(prior);
        let _rollback = PhaseRollback::new(&self.phase, DownloadPhase::Ready, prior);
        self.phase.advance(DownloadPhase::Downloading);

        let filename = sanitize_filename(suggested_filename.unwrap_or_else(|| filename_from_url(url)));
        match self.fetch_and_persist(url, filename).await {
            Ok(resource) => {
                self.phase.advance(DownloadPhase::Ready);
                info!(path = %resource.path.display(), size = resource.size, "Result downloaded");
                Ok(resource)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Result download failed");
                self.phase.restore(prior);
                Err(e)
            }
        }
    }

    async fn fetch_and_persist(&self, url: &str, filename: String) -> Result<LocalResource, UserError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UserError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UserError::Network(format!("HTTP {} fetching result", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UserError::Network(e.to_string()))?;
        let asset = ImageAsset::from_bytes(bytes.to_vec(), filename);
        debug!(size = asset.len(), content_type = %asset.content_type(), "Result fetched");

        let filename = asset.filename().to_string();
        let content_type = asset.content_type().to_string();
        let target = self.output_dir.join(&filename);
        let size = asset.len() as u64;

        let dir = self.output_dir.clone();
        let path = target.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&dir, &path, &asset.into_bytes()))
            .await
            .map_err(|e| UserError::Io(e.to_string()))??;

        Ok(LocalResource {
            path: target,
            filename,
            content_type,
            size,
        })
    }
}

fn persist_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), UserError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| UserError::Io(format!("failed to create {}: {}", dir.display(), e)))?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| UserError::Io(format!("failed to stage download: {}", e)))?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| UserError::Io(format!("failed to write download: {}", e)))?;
    staged
        .persist(target)
        .map_err(|e| UserError::Io(format!("failed to persist {}: {}", target.display(), e.error)))?;
    Ok(())
}

/// Last non-empty path segment of `url`, without query or fragment.
fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    match path.split_once('/') {
        Some((_host, rest)) => rest.rsplit('/').find(|s| !s.is_empty()).unwrap_or(DEFAULT_FILENAME),
        None => DEFAULT_FILENAME,
    }
}

/// Reduce `name` to a single safe path component.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
