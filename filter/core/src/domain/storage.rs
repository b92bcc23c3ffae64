// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Gateway - Anti-Corruption Layer for temporary image storage
//!
//! The inference provider can only read images it can fetch over HTTP, so a
//! client-held image is parked in shared object storage for the duration of
//! one filter run. This module defines the gateway trait, the image blob
//! and the handle to the parked object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Image blob owned by the client until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    filename: String,
    content_type: String,
}

impl ImageAsset {
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Build an asset, sniffing the MIME type from the content first and the
    /// filename extension second.
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let content_type = sniff_content_type(&bytes, &filename);
        Self {
            bytes,
            filename,
            content_type,
        }
    }

    /// Read an asset from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::InvalidKey(format!("{} has no file name", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::IoError(format!("failed to read {}: {}", path.display(), e)))?;
        Ok(Self::from_bytes(bytes, filename))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn sniff_content_type(bytes: &[u8], filename: &str) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => FALLBACK_CONTENT_TYPE,
    }
    .to_string()
}

/// Handle to a temporary object in the store.
///
/// Valid for one apply cycle only; keys are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredObjectRef {
    key: String,
    filename: String,
}

impl StoredObjectRef {
    pub fn new(key: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            filename: filename.into(),
        }
    }

    /// Fresh collision-resistant key: a random UUID prefixed to the filename.
    pub fn unique_key(filename: &str) -> String {
        format!("{}-{}", Uuid::new_v4(), filename)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Object store gateway
///
/// All three operations fail with [`StorageError`], which callers keep
/// distinct from errors talking to the filter endpoint.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `asset` under `key`.
    async fn put(&self, key: &str, asset: &ImageAsset) -> Result<StoredObjectRef, StorageError>;

    /// Derive a publicly fetchable download URL for a stored object.
    async fn download_url(&self, object: &StoredObjectRef) -> Result<String, StorageError>;

    /// Remove a stored object.
    async fn delete(&self, object: &StoredObjectRef) -> Result<(), StorageError>;
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".to_string()));
    }
    if key.chars().any(|c| c == '\r' || c == '\n') {
        return Err(StorageError::InvalidKey(format!(
            "key must not contain line breaks: {:?}",
            key
        )));
    }
    Ok(())
}

/// Errors that can occur during object store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout while communicating with storage backend")]
    Timeout,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown storage error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StorageError::Timeout
        } else if err.is_connect() {
            StorageError::Network(err.to_string())
        } else {
            StorageError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
