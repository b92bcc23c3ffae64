// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Firebase Cloud Storage Object Store
//!
//! Implements [`ObjectStore`] against the Firebase Storage REST API, the
//! same endpoints the Firebase web SDK uses.
//!
//! # API Endpoints
//!
//! - `POST /b/{bucket}/o?name={key}` - Upload raw bytes (returns metadata)
//! - `GET /b/{bucket}/o/{encoded key}` - Object metadata incl. download tokens
//! - `DELETE /b/{bucket}/o/{encoded key}` - Delete object
//!
//! Download URLs have the form
//! `{api_base}/b/{bucket}/o/{encoded key}?alt=media&token={token}` and are
//! fetchable without credentials, which is what the inference provider needs.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::storage::{validate_key, ImageAsset, ObjectStore, StorageError, StoredObjectRef};

/// Everything except RFC 3986 unreserved characters; `/` is encoded too.
const OBJECT_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Firebase Storage adapter
pub struct FirebaseStorageAdapter {
    client: Client,

    /// REST base URL (e.g., "https://firebasestorage.googleapis.com/v0")
    api_base: String,

    bucket: String,

    /// Sent as `Authorization: Firebase <token>` when present
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorageAdapter {
    pub fn new(api_base: impl Into<String>, bucket: impl Into<String>) -> Result<Self, StorageError> {
        Self::with_timeout(api_base, bucket, Duration::from_secs(30))
    }

    /// Create adapter with custom timeout
    pub fn with_timeout(
        api_base: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn objects_url(&self) -> String {
        format!("{}/b/{}/o", self.api_base, self.bucket)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.objects_url(), utf8_percent_encode(key, OBJECT_NAME))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("Authorization", format!("Firebase {}", token)),
            None => request,
        }
    }

    async fn status_error(key: &str, operation: &str, response: Response) -> StorageError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| format!("HTTP {}", status));
        match status {
            StatusCode::NOT_FOUND => StorageError::NotFound(key.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StorageError::PermissionDenied(format!("{} {}: {}", operation, key, body))
            }
            StatusCode::SERVICE_UNAVAILABLE => StorageError::Unavailable(body),
            _ => StorageError::Unknown(format!(
                "Failed to {} {}: HTTP {}: {}",
                operation, key, status, body
            )),
        }
    }
}

#[async_trait]
impl ObjectStore for FirebaseStorageAdapter {
    async fn put(&self, key: &str, asset: &ImageAsset) -> Result<StoredObjectRef, StorageError> {
        validate_key(key)?;

        let request = self
            .client
            .post(self.objects_url())
            .query(&[("uploadType", "media"), ("name", key)])
            .header("Content-Type", asset.content_type())
            .body(asset.bytes().to_vec());

        let response = self.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(key, "upload", response).await);
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tracing::debug!(object = %metadata.name, bucket = %self.bucket, "Uploaded object");

        Ok(StoredObjectRef::new(metadata.name, asset.filename()))
    }

    async fn download_url(&self, object: &StoredObjectRef) -> Result<String, StorageError> {
        let response = self
            .authorize(self.client.get(self.object_url(object.key())))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(object.key(), "read metadata of", response).await);
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|t| !t.is_empty()))
            .ok_or_else(|| {
                StorageError::PermissionDenied(format!("{} has no download token", object.key()))
            })?;

        Ok(format!(
            "{}?alt=media&token={}",
            self.object_url(object.key()),
            utf8_percent_encode(token, OBJECT_NAME)
        ))
    }

    async fn delete(&self, object: &StoredObjectRef) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.delete(self.object_url(object.key())))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            _ => Err(Self::status_error(object.key(), "delete", response).await),
        }
    }
}
