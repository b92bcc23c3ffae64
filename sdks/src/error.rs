// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! User-facing errors
//!
//! Every failure of a client action ends up as a [`UserError`], which the
//! presentation layer turns into a short [`Notification`]. Nothing here is
//! allowed to crash the caller.

use glitchify_core::domain::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

pub const MSG_NO_IMAGE: &str = "no image supplied";
pub const MSG_NOTHING_TO_DOWNLOAD: &str = "nothing to download";

#[derive(Debug, Error)]
pub enum UserError {
    /// Missing required input; no remote call was attempted
    #[error("{0}")]
    Validation(String),

    /// Another action of the same kind is still in flight
    #[error("another request is already in progress")]
    Busy,

    /// Upload, URL derivation or delete against the object store failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The filter endpoint answered with a non-200 envelope
    #[error("{0}")]
    Remote(String),

    /// The filter endpoint or the result URL could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// Writing the downloaded result to disk failed
    #[error("local I/O error: {0}")]
    Io(String),
}

impl UserError {
    pub fn validation(message: impl Into<String>) -> Self {
        UserError::Validation(message.into())
    }

    /// Short message suitable for a toast.
    pub fn notification(&self) -> Notification {
        let message = match self {
            UserError::Validation(message) | UserError::Remote(message) => message.clone(),
            UserError::Busy => "please wait for the current request to finish".to_string(),
            UserError::Storage(_) => "failed to upload the file".to_string(),
            UserError::Network(_) => "could not reach the server".to_string(),
            UserError::Io(_) => "failed to save the image".to_string(),
        };
        Notification::error(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
