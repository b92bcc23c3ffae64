// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Inference
//!
//! Domain interface for the external image stylization provider.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-Corruption Layer between the filter handler and the
//!   vendor inference API

// Implementations in infrastructure/inference/ directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Face-to-many model pinned to the version the filter was tuned against.
pub const FACE_TO_MANY_MODEL: &str =
    "fofr/face-to-many:35cea9c3164d9fb7fbd48b51503eabdb39c9d04fdaef9a68f368bed8087ec5f9";

/// Domain interface for inference providers
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run `model_id` against `input`.
    ///
    /// `Ok(None)` means the provider finished but produced no output. The
    /// returned sequence may hold several candidate URLs, in provider order.
    async fn run(
        &self,
        model_id: &str,
        input: &StyleInput,
    ) -> Result<Option<Vec<String>>, InferenceError>;
}

/// Input document sent to the stylization model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleInput {
    /// Publicly fetchable URL of the source image
    pub image: String,
    pub style: String,
    pub prompt: String,
    pub prompt_strength: f64,
    pub denoising_strength: f64,
    pub instant_id_strength: f64,
}

/// A named style with fixed guidance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePreset {
    pub style: &'static str,
    pub prompt: &'static str,
    pub prompt_strength: f64,
    pub denoising_strength: f64,
    /// How strongly the subject's facial identity is preserved
    pub instant_id_strength: f64,
}

/// The only preset the filter endpoint applies.
pub const VIDEO_GAME: StylePreset = StylePreset {
    style: "Video game",
    prompt: "pixelated glitchart of close-up of (subject), ps1 playstation ps gamecube game radioctive dreams screencapture, bryce 3d",
    prompt_strength: 4.5,
    denoising_strength: 0.65,
    instant_id_strength: 0.8,
};

impl StylePreset {
    pub fn input_for(&self, image_url: &str) -> StyleInput {
        StyleInput {
            image: image_url.to_string(),
            style: self.style.to_string(),
            prompt: self.prompt.to_string(),
            prompt_strength: self.prompt_strength,
            denoising_strength: self.denoising_strength,
            instant_id_strength: self.instant_id_strength,
        }
    }
}

/// Errors that can occur while talking to the inference provider
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Inference timed out after {0}s")]
    Timeout(u64),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InferenceError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            InferenceError::Provider(format!("failed to parse response: {}", err))
        } else {
            InferenceError::Network(err.to_string())
        }
    }
}
