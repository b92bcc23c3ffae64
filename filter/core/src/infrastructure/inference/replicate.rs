// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Replicate Inference Provider Adapter
//!
//! Anti-Corruption Layer for the Replicate predictions API.
//!
//! # API Endpoints
//!
//! - `POST /predictions` - Create a prediction for a pinned model version
//! - `POST /models/{owner}/{name}/predictions` - Create a prediction for the
//!   latest version of an official model
//! - `GET {urls.get}` - Poll a prediction until it reaches a terminal state
//!
//! Creation is sent with `Prefer: wait` so short predictions complete in the
//! first round trip; anything still `starting`/`processing` is polled until
//! the configured timeout elapses.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::domain::inference::{InferenceError, InferenceProvider, StyleInput};

/// Longest synchronous wait Replicate accepts on prediction creation.
const MAX_PREFER_WAIT_SECS: u64 = 60;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct ReplicateAdapter {
    client: Client,
    api_base: String,
    api_token: String,
    timeout: Duration,
    poll_interval: Duration,
}

#[derive(Serialize)]
struct CreatePrediction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: &'a StyleInput,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl ReplicateAdapter {
    /// Create an adapter whose HTTP client is bounded by `timeout`.
    pub fn new(
        api_base: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            timeout,
            poll_interval: Duration::from_secs(1),
        })
    }

    /// Set the delay between polls; never shorter than 10ms.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Endpoint and pinned version for `owner/name[:version]`.
    fn creation_target<'a>(&self, model_id: &'a str) -> (String, Option<&'a str>) {
        match model_id.split_once(':') {
            Some((_, version)) => (format!("{}/predictions", self.api_base), Some(version)),
            None => (format!("{}/models/{}/predictions", self.api_base, model_id), None),
        }
    }

    fn prefer_wait(&self) -> String {
        let secs = self.timeout.as_secs().clamp(1, MAX_PREFER_WAIT_SECS);
        format!("wait={}", secs)
    }

    async fn parse_prediction(&self, model_id: &str, response: Response) -> Result<Prediction, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    InferenceError::Authentication(error_text)
                }
                StatusCode::TOO_MANY_REQUESTS => InferenceError::RateLimit,
                StatusCode::NOT_FOUND => InferenceError::ModelNotFound(model_id.to_string()),
                _ => InferenceError::Provider(format!("HTTP {}: {}", status, error_text)),
            });
        }

        response
            .json::<Prediction>()
            .await
            .map_err(|e| InferenceError::Provider(format!("Failed to parse prediction: {}", e)))
    }

    fn remaining(&self, started: Instant) -> Result<Duration, InferenceError> {
        let remaining = self.timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(InferenceError::Timeout(self.timeout.as_secs()));
        }
        Ok(remaining)
    }

    fn deadline_error(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout(self.timeout.as_secs())
        } else {
            err.into()
        }
    }

    async fn poll(
        &self,
        model_id: &str,
        mut prediction: Prediction,
        started: Instant,
    ) -> Result<Prediction, InferenceError> {
        loop {
            match prediction.status {
                PredictionStatus::Succeeded => return Ok(prediction),
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    let reason = prediction
                        .error
                        .as_ref()
                        .map(|e| match e {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_else(|| format!("prediction {} {:?}", prediction.id, prediction.status));
                    return Err(InferenceError::Prediction(reason));
                }
                PredictionStatus::Starting | PredictionStatus::Processing | PredictionStatus::Unknown => {}
            }

            let poll_url = prediction
                .urls
                .as_ref()
                .and_then(|urls| urls.get.as_deref())
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .ok_or_else(|| InferenceError::Provider("prediction missing poll URL".to_string()))?
                .to_string();

            // Sleep and request both share what is left of the deadline
            let remaining = self.remaining(started)?;
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
            let remaining = self.remaining(started)?;

            tracing::debug!(prediction = %prediction.id, "Polling Replicate prediction");
            let response = self
                .client
                .get(&poll_url)
                .bearer_auth(&self.api_token)
                .timeout(remaining)
                .send()
                .await
                .map_err(|e| self.deadline_error(e))?;
            prediction = self.parse_prediction(model_id, response).await?;
        }
    }
}

/// Collect output URLs from a prediction's `output` field.
///
/// Models return either a single URL or a list of URLs; a missing or null
/// output means no result.
fn extract_output_urls(output: Option<Value>) -> Option<Vec<String>> {
    match output? {
        Value::Null => None,
        Value::String(url) => Some(vec![url]),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(url) => Some(url),
                    _ => None,
                })
                .collect(),
        ),
        _ => Some(Vec::new()),
    }
}

#[async_trait]
impl InferenceProvider for ReplicateAdapter {
    async fn run(
        &self,
        model_id: &str,
        input: &StyleInput,
    ) -> Result<Option<Vec<String>>, InferenceError> {
        let started = Instant::now();
        let (endpoint, version) = self.creation_target(model_id);
        let body = CreatePrediction { version, input };

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_token)
            .header("Prefer", self.prefer_wait())
            .json(&body)
            .send()
            .await?;

        let prediction = self.parse_prediction(model_id, response).await?;
        tracing::debug!(prediction = %prediction.id, status = ?prediction.status, "Replicate prediction created");

        let prediction = self.poll(model_id, prediction, started).await?;
        Ok(extract_output_urls(prediction.output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inference::{FACE_TO_MANY_MODEL, VIDEO_GAME};
    use mockito::Matcher;
    use serde_json::json;

    fn adapter(base: &str) -> ReplicateAdapter {
        ReplicateAdapter::new(base, "r8_test", Duration::from_secs(5))
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_creation_target_for_pinned_and_official_models() {
        let adapter = adapter("https://api.replicate.com/v1/");
        let (endpoint, version) = adapter.creation_target(FACE_TO_MANY_MODEL);
        assert_eq!(endpoint, "https://api.replicate.com/v1/predictions");
        assert_eq!(version.map(str::len), Some(64));

        let (endpoint, version) = adapter.creation_target("fofr/face-to-many");
        assert_eq!(endpoint, "https://api.replicate.com/v1/models/fofr/face-to-many/predictions");
        assert_eq!(version, None);
    }

    #[test]
    fn test_extract_output_urls() {
        assert_eq!(extract_output_urls(None), None);
        assert_eq!(extract_output_urls(Some(Value::Null)), None);
        assert_eq!(
            extract_output_urls(Some(json!("https://cdn/a.png"))),
            Some(vec!["https://cdn/a.png".to_string()])
        );
        assert_eq!(
            extract_output_urls(Some(json!(["https://cdn/a.png", 3, "https://cdn/b.png"]))),
            Some(vec!["https://cdn/a.png".to_string(), "https://cdn/b.png".to_string()])
        );
    }

    #[tokio::test]
    async fn test_synchronous_success() {
        let mut server = mockito::Server::new_async().await;
        let input = VIDEO_GAME.input_for("https://store/cat.png");
        let mock = server
            .mock("POST", "/predictions")
            .match_header("authorization", "Bearer r8_test")
            .match_header("prefer", "wait=5")
            .match_body(Matcher::PartialJson(json!({
                "version": "35cea9c3164d9fb7fbd48b51503eabdb39c9d04fdaef9a68f368bed8087ec5f9",
                "input": {"image": "https://store/cat.png", "style": "Video game"}
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "p1",
                    "status": "succeeded",
                    "output": ["https://cdn/out.png", "https://cdn/out-2.png"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let outputs = adapter(&server.url()).run(FACE_TO_MANY_MODEL, &input).await.unwrap();
        assert_eq!(
            outputs,
            Some(vec!["https://cdn/out.png".to_string(), "https://cdn/out-2.png".to_string()])
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_polls_until_succeeded() {
        let mut server = mockito::Server::new_async().await;
        let poll_url = format!("{}/predictions/p2", server.url());
        server
            .mock("POST", "/predictions")
            .with_status(201)
            .with_body(
                json!({"id": "p2", "status": "processing", "urls": {"get": poll_url}}).to_string(),
            )
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/predictions/p2")
            .match_header("authorization", "Bearer r8_test")
            .with_status(200)
            .with_body(
                json!({"id": "p2", "status": "succeeded", "output": "https://cdn/late.png"}).to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let input = VIDEO_GAME.input_for("https://store/cat.png");
        let outputs = adapter(&server.url()).run(FACE_TO_MANY_MODEL, &input).await.unwrap();
        assert_eq!(outputs, Some(vec!["https://cdn/late.png".to_string()]));
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_prediction() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .with_status(201)
            .with_body(json!({"id": "p3", "status": "failed", "error": "no face detected"}).to_string())
            .create_async()
            .await;

        let input = VIDEO_GAME.input_for("https://store/cat.png");
        let result = adapter(&server.url()).run(FACE_TO_MANY_MODEL, &input).await;
        match result {
            Err(InferenceError::Prediction(reason)) => assert_eq!(reason, "no face detected"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_succeeded_without_output() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .with_status(201)
            .with_body(json!({"id": "p4", "status": "succeeded", "output": null}).to_string())
            .create_async()
            .await;

        let input = VIDEO_GAME.input_for("https://store/cat.png");
        let outputs = adapter(&server.url()).run(FACE_TO_MANY_MODEL, &input).await.unwrap();
        assert_eq!(outputs, None);
    }

    #[tokio::test]
    async fn test_http_error_mapping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .with_status(401)
            .with_body("invalid token")
            .create_async()
            .await;
        let input = VIDEO_GAME.input_for("https://store/cat.png");
        let result = adapter(&server.url()).run(FACE_TO_MANY_MODEL, &input).await;
        assert!(matches!(result, Err(InferenceError::Authentication(_))));

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .with_status(429)
            .create_async()
            .await;
        let result = adapter(&server.url()).run(FACE_TO_MANY_MODEL, &input).await;
        assert!(matches!(result, Err(InferenceError::RateLimit)));
    }

    #[tokio::test]
    async fn test_polling_is_bounded_by_timeout() {
        let mut server = mockito::Server::new_async().await;
        let poll_url = format!("{}/predictions/p5", server.url());
        let still_running =
            json!({"id": "p5", "status": "processing", "urls": {"get": poll_url}}).to_string();
        server
            .mock("POST", "/predictions")
            .with_status(201)
            .with_body(still_running.clone())
            .create_async()
            .await;
        server
            .mock("GET", "/predictions/p5")
            .with_status(200)
            .with_body(still_running)
            .create_async()
            .await;

        let adapter = ReplicateAdapter::new(server.url(), "r8_test", Duration::from_millis(200))
            .unwrap()
            .with_poll_interval(Duration::from_millis(20));
        let input = VIDEO_GAME.input_for("https://store/cat.png");
        let result = adapter.run(FACE_TO_MANY_MODEL, &input).await;
        assert!(matches!(result, Err(InferenceError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_slow_poll_is_cut_at_deadline() {
        // Accepts poll connections and never answers them
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let poll_url = format!("http://{}/predictions/p6", silent.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = silent.accept().await {
                held.push(socket);
            }
        });

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predictions")
            .with_status(201)
            .with_body(
                json!({"id": "p6", "status": "processing", "urls": {"get": poll_url}}).to_string(),
            )
            .create_async()
            .await;

        let timeout = Duration::from_millis(500);
        let adapter = ReplicateAdapter::new(server.url(), "r8_test", timeout)
            .unwrap()
            .with_poll_interval(Duration::from_millis(20));
        let input = VIDEO_GAME.input_for("https://store/cat.png");

        let started = Instant::now();
        let result = adapter.run(FACE_TO_MANY_MODEL, &input).await;

        assert!(matches!(result, Err(InferenceError::Timeout(_))), "got {:?}", result);
        assert!(started.elapsed() < timeout * 3 / 2, "took {:?}", started.elapsed());
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let adapter = adapter("https://api.replicate.com/v1").with_poll_interval(Duration::ZERO);
        assert_eq!(adapter.poll_interval, MIN_POLL_INTERVAL);
    }
}
