// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use glitchify_core::domain::config::ClientConfig;
use glitchify_core::domain::envelope::{FilterRequest, FilterResponse};

/// Transport-level failures talking to the filter endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response (HTTP {status}): {detail}")]
    InvalidResponse { status: u16, detail: String },
}

/// The filter endpoint as seen from the client.
#[async_trait]
pub trait FilterApi: Send + Sync {
    async fn apply_filter(&self, image_url: &str) -> Result<FilterResponse, ClientError>;
}

/// Client for the Glitchify filter endpoint.
pub struct GlitchifyClient {
    base_url: String,
    client: Client,
}

impl GlitchifyClient {
    /// Create a new client; `base_url` is the API root, e.g.
    /// `http://localhost:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client with an overall request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build a client for the configured environment.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Ok(Self::with_timeout(config.api_base_url()?, config.timeout())?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FilterApi for GlitchifyClient {
    /// POST the image URL to `{base}/apply-filter`.
    ///
    /// The envelope is decoded whatever the HTTP status; only an
    /// undecodable body is an error.
    async fn apply_filter(&self, image_url: &str) -> Result<FilterResponse, ClientError> {
        let url = format!("{}/apply-filter", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&FilterRequest::new(image_url))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse {
            status,
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_apply_filter_posts_image_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/apply-filter")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"imageURL": "https://store/cat.png"})))
            .with_status(200)
            .with_body(
                json!({
                    "code": 200,
                    "message": "filter applied successfully",
                    "data": {"outputImage": "https://cdn/out.png"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GlitchifyClient::new(format!("{}/api/", server.url()));
        let response = client.apply_filter("https://store/cat.png").await.unwrap();

        assert_eq!(response.output_image(), Some("https://cdn/out.png"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_envelope_is_decoded_despite_http_500() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/apply-filter")
            .with_status(500)
            .with_body(json!({"code": 500, "message": "image not found", "data": null}).to_string())
            .create_async()
            .await;

        let client = GlitchifyClient::new(format!("{}/api", server.url()));
        let response = client.apply_filter("https://store/cat.png").await.unwrap();
        assert_eq!(response, FilterResponse::image_not_found());
    }

    #[tokio::test]
    async fn test_non_envelope_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/apply-filter")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let client = GlitchifyClient::new(format!("{}/api", server.url()));
        let result = client.apply_filter("https://store/cat.png").await;
        assert!(matches!(result, Err(ClientError::InvalidResponse { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = GlitchifyClient::with_timeout("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
        let result = client.apply_filter("https://store/cat.png").await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }

    #[test]
    fn test_from_config_uses_environment_base() {
        let config = ClientConfig {
            production_origin: "https://glitch.example".to_string(),
            ..ClientConfig::default()
        };
        let client = GlitchifyClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://glitch.example/api");
    }
}
