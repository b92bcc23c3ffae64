// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Filter Envelope
//!
//! Wire contract of `POST /api/apply-filter`. Every response the filter
//! endpoint produces is a [`FilterResponse`]; the `code` field inside the
//! body is authoritative, the HTTP status only mirrors it.
//!
//! The fields of [`FilterResponse`] are private: in code an envelope can
//! only come from its constructors, so `code == 200 ⇔ data != null ⇔
//! outputImage non-empty` holds for everything this workspace builds.
//! Envelopes decoded from the wire can break it and are checked with
//! [`FilterResponse::is_well_formed`].

use serde::{Deserialize, Serialize};

/// Envelope code for a successful filter run.
pub const CODE_OK: u16 = 200;

/// Envelope code for every failure class (validation and internal).
pub const CODE_FAILURE: u16 = 500;

pub const MSG_IMAGE_NOT_FOUND: &str = "image not found";
pub const MSG_GENERATION_FAILED: &str = "image generation failed";
pub const MSG_FILTER_APPLIED: &str = "filter applied successfully";
pub const MSG_INTERNAL_ERROR: &str = "internal server error";

/// Body of `POST /api/apply-filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(rename = "imageURL", default)]
    pub image_url: Option<String>,
}

impl FilterRequest {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
        }
    }

    /// The image URL, or `None` when it is missing, null or blank.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(rename = "outputImage")]
    pub output_image: String,
}

/// Uniform response envelope `{code, message, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResponse {
    code: u16,
    message: String,
    data: Option<FilterData>,
}

impl FilterResponse {
    /// Success envelope carrying the stylized image URL.
    ///
    /// Returns a generation failure instead when `output_image` is blank, so
    /// a success envelope never carries an empty URL.
    pub fn success(output_image: impl Into<String>) -> Self {
        let output_image = output_image.into();
        if output_image.trim().is_empty() {
            return Self::failure(MSG_GENERATION_FAILED);
        }
        Self {
            code: CODE_OK,
            message: MSG_FILTER_APPLIED.to_string(),
            data: Some(FilterData { output_image }),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: CODE_FAILURE,
            message: message.into(),
            data: None,
        }
    }

    pub fn image_not_found() -> Self {
        Self::failure(MSG_IMAGE_NOT_FOUND)
    }

    pub fn generation_failed() -> Self {
        Self::failure(MSG_GENERATION_FAILED)
    }

    pub fn internal_error() -> Self {
        Self::failure(MSG_INTERNAL_ERROR)
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }

    pub fn data(&self) -> Option<&FilterData> {
        self.data.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    /// Output URL of a well-formed success envelope.
    pub fn output_image(&self) -> Option<&str> {
        if !self.is_success() {
            return None;
        }
        self.data
            .as_ref()
            .map(|data| data.output_image.as_str())
            .filter(|url| !url.trim().is_empty())
    }

    /// Checks the envelope invariant on data received from the wire.
    pub fn is_well_formed(&self) -> bool {
        match (&self.data, self.is_success()) {
            (Some(data), true) => !data.output_image.trim().is_empty(),
            (None, false) => true,
            _ => false,
        }
    }
}
