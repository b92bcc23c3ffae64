// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Inference Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain InferenceProvider interface and
// a vendor API. The provider is built once at startup and shared by every
// request through an Arc.

pub mod replicate;

pub use replicate::ReplicateAdapter;
pub use mock::{MockBehavior, MockInferenceProvider};

use std::sync::Arc;

use crate::domain::config::{resolve_secret, InferenceConfig, InferenceProviderKind};
use crate::domain::inference::InferenceProvider;

/// Create the process-wide inference provider from configuration
pub fn create_inference_provider(
    config: &InferenceConfig,
) -> anyhow::Result<Arc<dyn InferenceProvider>> {
    let provider: Arc<dyn InferenceProvider> = match config.provider {
        InferenceProviderKind::Replicate => {
            let api_token = resolve_secret(&config.api_token)?
                .filter(|token| !token.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("Replicate API token is not configured"))?;
            let adapter = ReplicateAdapter::new(config.api_base.clone(), api_token, config.timeout())?
                .with_poll_interval(config.poll_interval());
            tracing::info!(api_base = %config.api_base, "Initialized Replicate inference provider");
            Arc::new(adapter)
        }
        InferenceProviderKind::Mock => {
            tracing::warn!("Using mock inference provider; images will not be stylized");
            Arc::new(MockInferenceProvider::echo())
        }
    };
    Ok(provider)
}

mod mock {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::domain::inference::{InferenceError, InferenceProvider, StyleInput};

    /// What a [`MockInferenceProvider`] does when run.
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this output sequence (or no output at all)
        Outputs(Option<Vec<String>>),
        /// Return the input image URL as the single output
        Echo,
        /// Fail with a provider error
        Fail(String),
        /// Panic inside `run`
        Panic,
    }

    /// Scripted provider that records every call it receives.
    pub struct MockInferenceProvider {
        behavior: MockBehavior,
        calls: Mutex<Vec<(String, StyleInput)>>,
    }

    impl MockInferenceProvider {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn returning<S: Into<String>>(outputs: Vec<S>) -> Self {
            Self::new(MockBehavior::Outputs(Some(
                outputs.into_iter().map(Into::into).collect(),
            )))
        }

        pub fn empty() -> Self {
            Self::new(MockBehavior::Outputs(None))
        }

        pub fn echo() -> Self {
            Self::new(MockBehavior::Echo)
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn panicking() -> Self {
            Self::new(MockBehavior::Panic)
        }

        pub fn calls(&self) -> Vec<(String, StyleInput)> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl InferenceProvider for MockInferenceProvider {
        async fn run(
            &self,
            model_id: &str,
            input: &StyleInput,
        ) -> Result<Option<Vec<String>>, InferenceError> {
            self.calls.lock().push((model_id.to_string(), input.clone()));
            match &self.behavior {
                MockBehavior::Outputs(outputs) => Ok(outputs.clone()),
                MockBehavior::Echo => Ok(Some(vec![input.image.clone()])),
                MockBehavior::Fail(message) => Err(InferenceError::Provider(message.clone())),
                MockBehavior::Panic => panic!("mock inference provider panicked"),
            }
        }
    }
}
