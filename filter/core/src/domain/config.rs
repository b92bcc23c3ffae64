// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Glitchify Configuration
//
// One YAML document drives both halves of the system:
// - server: where the filter endpoint listens
// - inference: which provider runs the model, credentials, timeouts
// - storage: the temporary object store used by the client
// - client: how the client reaches the filter endpoint
//
// Environment variables override the file after it is loaded so container
// deployments can run without a config file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::inference::FACE_TO_MANY_MODEL;

pub const ENV_CONFIG_PATH: &str = "GLITCHIFY_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlitchifyConfig {
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub storage: StorageConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProviderKind {
    Replicate,
    /// Scripted provider for local development; never calls out
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub provider: InferenceProviderKind,

    /// Provider API base URL
    pub api_base: String,

    /// API token (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// `owner/name` or `owner/name:version`
    pub model: String,

    /// Upper bound on one inference call, including polling
    pub timeout_secs: u64,

    pub poll_interval_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: InferenceProviderKind::Replicate,
            api_base: "https://api.replicate.com/v1".to_string(),
            api_token: Some("env:REPLICATE_API_TOKEN".to_string()),
            model: FACE_TO_MANY_MODEL.to_string(),
            timeout_secs: 120,
            poll_interval_ms: 1000,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Firebase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,

    /// Bucket name, e.g. "my-project.appspot.com"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    pub api_base: String,

    /// Optional bearer token (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Firebase,
            bucket: None,
            api_base: "https://firebasestorage.googleapis.com/v0".to_string(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub environment: Environment,

    /// Filter API base used in development, e.g. "http://localhost:3000/api"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Origin the filter endpoint is co-hosted on in production
    pub production_origin: String,

    pub download_dir: PathBuf,

    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            api_url: None,
            production_origin: "http://127.0.0.1:3000".to_string(),
            download_dir: PathBuf::from("."),
            timeout_secs: 180,
        }
    }
}

impl ClientConfig {
    /// Base URL the client appends `/apply-filter` to.
    ///
    /// Development talks to an explicitly configured endpoint; production
    /// uses the `/api` path on the co-hosted origin.
    pub fn api_base_url(&self) -> anyhow::Result<String> {
        match self.environment {
            Environment::Development => {
                let url = self
                    .api_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!("client.api_url is required in development")
                    })?;
                Ok(url.trim_end_matches('/').to_string())
            }
            Environment::Production => Ok(format!(
                "{}/api",
                self.production_origin.trim_end_matches('/')
            )),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolve a secret that may be given as "env:VAR_NAME".
pub fn resolve_secret(value: &Option<String>) -> anyhow::Result<Option<String>> {
    match value {
        Some(v) => match v.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name)
                .map(Some)
                .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
            None => Ok(Some(v.clone())),
        },
        None => Ok(None),
    }
}

impl GlitchifyConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Discover configuration file using precedence order
    /// 1. GLITCHIFY_CONFIG_PATH environment variable
    /// 2. ./glitchify-config.yaml (working directory)
    /// 3. ~/.glitchify/config.yaml (user home)
    /// 4. /etc/glitchify/config.yaml (Unix only)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./glitchify-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".glitchify").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/glitchify/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(val) = get("GLITCHIFY_ENV") {
            match val.to_lowercase().as_str() {
                "development" | "dev" => self.client.environment = Environment::Development,
                "production" | "prod" => self.client.environment = Environment::Production,
                _ => tracing::warn!(
                    "Invalid value for GLITCHIFY_ENV: '{}'. Expected development/production. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = get("GLITCHIFY_API_URL") {
            self.client.api_url = Some(val);
        }

        if let Some(val) = get("FIREBASE_STORAGE_BUCKET") {
            self.storage.bucket = Some(val);
        }

        if let Some(val) = get("GLITCHIFY_INFERENCE_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => self.inference.timeout_secs = secs,
                Err(_) => tracing::warn!(
                    "Invalid value for GLITCHIFY_INFERENCE_TIMEOUT_SECS: '{}'. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.inference.model.trim().is_empty() {
            anyhow::bail!("inference.model must not be empty");
        }
        if self.inference.timeout_secs == 0 {
            anyhow::bail!("inference.timeout_secs must be greater than zero");
        }
        if self.inference.poll_interval_ms == 0 {
            anyhow::bail!("inference.poll_interval_ms must be greater than zero");
        }
        if self.storage.backend == StorageBackendKind::Firebase
            && self.storage.bucket.as_deref().map_or(true, |b| b.trim().is_empty())
        {
            anyhow::bail!("storage.bucket is required for the firebase backend");
        }
        self.client.api_base_url()?;
        Ok(())
    }
}
