// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Filter Request Handler
//!
//! Single-purpose use case behind `POST /api/apply-filter`: take an image
//! URL, run it through the video-game style preset and fold every outcome
//! into a [`FilterResponse`]. The handler holds no mutable state, so one
//! instance is shared by all concurrent requests.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::envelope::{FilterRequest, FilterResponse};
use crate::domain::inference::{InferenceProvider, StylePreset, FACE_TO_MANY_MODEL, VIDEO_GAME};

pub struct FilterRequestHandler {
    provider: Arc<dyn InferenceProvider>,
    model_id: String,
    preset: StylePreset,
}

impl FilterRequestHandler {
    /// Build a handler around a provider that was constructed once at
    /// startup.
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self {
            provider,
            model_id: FACE_TO_MANY_MODEL.to_string(),
            preset: VIDEO_GAME,
        }
    }

    /// Override the model identifier. The style parameters stay fixed.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Handle one filter request. Never fails: every path yields an envelope.
    pub async fn handle(&self, request: FilterRequest) -> FilterResponse {
        let Some(image_url) = request.image_url() else {
            warn!("Filter request rejected: imageURL missing");
            return FilterResponse::image_not_found();
        };

        let input = self.preset.input_for(image_url);
        debug!(model = %self.model_id, image = %image_url, "Invoking inference provider");

        // A panicking provider must not take the connection down with it
        let outcome = AssertUnwindSafe(self.provider.run(&self.model_id, &input))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(outputs)) => match first_output(outputs) {
                Some(output_image) => {
                    info!(output = %output_image, "Filter applied");
                    FilterResponse::success(output_image)
                }
                None => {
                    warn!(model = %self.model_id, "Inference provider returned no usable output");
                    FilterResponse::generation_failed()
                }
            },
            Ok(Err(e)) => {
                error!(error = %e, model = %self.model_id, "Inference provider call failed");
                FilterResponse::internal_error()
            }
            Err(_) => {
                error!(model = %self.model_id, "Inference provider panicked");
                FilterResponse::internal_error()
            }
        }
    }
}

/// First candidate, provided it is a non-blank URL.
fn first_output(outputs: Option<Vec<String>>) -> Option<String> {
    outputs?
        .into_iter()
        .next()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::{CODE_FAILURE, CODE_OK, MSG_GENERATION_FAILED, MSG_IMAGE_NOT_FOUND, MSG_INTERNAL_ERROR};
    use crate::infrastructure::inference::MockInferenceProvider;

    fn handler(provider: &Arc<MockInferenceProvider>) -> FilterRequestHandler {
        FilterRequestHandler::new(provider.clone())
    }

    #[tokio::test]
    async fn test_missing_url_never_reaches_provider() {
        let provider = Arc::new(MockInferenceProvider::returning(vec!["https://cdn/a.png"]));
        let response = handler(&provider).handle(FilterRequest::default()).await;

        assert_eq!(response, FilterResponse::failure(MSG_IMAGE_NOT_FOUND));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_output_is_selected() {
        let provider = Arc::new(MockInferenceProvider::returning(vec!["urlA", "urlB"]));
        let response = handler(&provider)
            .handle(FilterRequest::new("https://store/cat.png"))
            .await;

        assert_eq!(response.code(), CODE_OK);
        assert_eq!(response.output_image(), Some("urlA"));
        assert!(response.is_well_formed());
    }

    #[tokio::test]
    async fn test_fixed_style_parameters_are_sent() {
        let provider = Arc::new(MockInferenceProvider::returning(vec!["https://cdn/out.png"]));
        handler(&provider)
            .handle(FilterRequest::new("https://store/cat.png"))
            .await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let (model, input) = &calls[0];
        assert_eq!(model, FACE_TO_MANY_MODEL);
        assert_eq!(input, &VIDEO_GAME.input_for("https://store/cat.png"));
    }

    #[tokio::test]
    async fn test_model_override() {
        let provider = Arc::new(MockInferenceProvider::returning(vec!["https://cdn/out.png"]));
        let handler = handler(&provider).with_model("fofr/face-to-many");
        handler.handle(FilterRequest::new("https://store/cat.png")).await;

        assert_eq!(provider.calls()[0].0, "fofr/face-to-many");
    }

    #[tokio::test]
    async fn test_no_output_is_generation_failure() {
        let provider = Arc::new(MockInferenceProvider::empty());
        let response = handler(&provider)
            .handle(FilterRequest::new("https://store/cat.png"))
            .await;

        assert_eq!(response.code(), CODE_FAILURE);
        assert_eq!(response.message(), MSG_GENERATION_FAILED);
        assert!(response.data().is_none());
    }

    #[tokio::test]
    async fn test_empty_sequence_and_blank_first_url_are_generation_failures() {
        for outputs in [Vec::<&str>::new(), vec!["  ", "https://cdn/b.png"]] {
            let provider = Arc::new(MockInferenceProvider::returning(outputs));
            let response = handler(&provider)
                .handle(FilterRequest::new("https://store/cat.png"))
                .await;
            assert_eq!(response, FilterResponse::generation_failed());
        }
    }

    #[tokio::test]
    async fn test_provider_error_is_internal_error() {
        let provider = Arc::new(MockInferenceProvider::failing("quota exhausted"));
        let response = handler(&provider)
            .handle(FilterRequest::new("https://store/cat.png"))
            .await;

        assert_eq!(response, FilterResponse::failure(MSG_INTERNAL_ERROR));
    }

    #[tokio::test]
    async fn test_provider_panic_is_internal_error() {
        let provider = Arc::new(MockInferenceProvider::panicking());
        let response = handler(&provider)
            .handle(FilterRequest::new("https://store/cat.png"))
            .await;

        assert_eq!(response, FilterResponse::internal_error());
    }

    #[tokio::test]
    async fn test_every_outcome_is_well_formed() {
        let providers = vec![
            MockInferenceProvider::returning(vec!["https://cdn/a.png"]),
            MockInferenceProvider::returning(Vec::<&str>::new()),
            MockInferenceProvider::empty(),
            MockInferenceProvider::failing("boom"),
            MockInferenceProvider::panicking(),
        ];
        for provider in providers {
            let handler = FilterRequestHandler::new(Arc::new(provider));
            for request in [FilterRequest::default(), FilterRequest::new("https://store/x.png")] {
                let response = handler.handle(request).await;
                assert!(response.is_well_formed(), "{:?}", response);
                assert_eq!(response.code() == CODE_OK, response.data().is_some());
            }
        }
    }
}
