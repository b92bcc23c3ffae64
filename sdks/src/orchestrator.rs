// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Upload/Apply Orchestrator
//!
//! Drives one filter run from the client side:
//!
//! 1. park the image in the object store under a fresh key
//! 2. derive a public download URL for it
//! 3. POST that URL to the filter endpoint
//! 4. publish the result (or the failure) to the UI state
//! 5. delete the parked object
//!
//! The parked object is held by a [`TemporaryObject`] lease, which is
//! released on every exit path once the upload succeeded. Re-entry is gated
//! by a busy flag: a second `apply` while one is running is rejected.

use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use glitchify_core::domain::storage::{ImageAsset, ObjectStore, StorageError, StoredObjectRef};

use crate::client::FilterApi;
use crate::error::{Notification, UserError, MSG_NO_IMAGE};
use crate::state::{ApplyPhase, BusyGuard, PhaseRollback, PhaseTracker};

/// Result of a successful filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub output_image: String,
    /// Server-supplied success message
    pub message: String,
}

impl FilterOutcome {
    pub fn notification(&self) -> Notification {
        Notification::success(self.message.clone())
    }
}

pub struct ApplyOrchestrator {
    store: Arc<dyn ObjectStore>,
    api: Arc<dyn FilterApi>,
    busy: AtomicBool,
    phase: PhaseTracker<ApplyPhase>,
    result: Mutex<Option<String>>,
}

impl ApplyOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>, api: Arc<dyn FilterApi>) -> Self {
        Self {
            store,
            api,
            busy: AtomicBool::new(false),
            phase: PhaseTracker::new(ApplyPhase::Idle, ApplyPhase::can_transition_to),
            result: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> ApplyPhase {
        self.phase.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<ApplyPhase> {
        self.phase.subscribe()
    }

    /// Output URL of the last successful run.
    pub fn current_result(&self) -> Option<String> {
        self.result.lock().clone()
    }

    /// Upload `image`, run the filter on it and clean up.
    ///
    /// Every call uploads a new object and triggers a new inference run;
    /// nothing is deduplicated.
    pub async fn apply(&self, image: Option<ImageAsset>) -> Result<FilterOutcome, UserError> {
        let Some(image) = image else {
            return Err(UserError::validation(MSG_NO_IMAGE));
        };
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("Apply rejected: another run is in flight");
            return Err(UserError::Busy);
        };

        // Every run starts from Idle and ends in Success or back at Idle
        self.phase.restore(ApplyPhase::Idle);
        let _rollback = PhaseRollback::new(&self.phase, ApplyPhase::Success, ApplyPhase::Idle);
        self.phase.advance(ApplyPhase::Uploading);

        match self.run(&image).await {
            Ok(outcome) => {
                *self.result.lock() = Some(outcome.output_image.clone());
                self.phase.advance(ApplyPhase::Success);
                info!(output = %outcome.output_image, "Filter run succeeded");
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, filename = %image.filename(), "Filter run failed");
                self.phase.advance(ApplyPhase::Failed);
                self.phase.advance(ApplyPhase::Idle);
                Err(e)
            }
        }
    }

    async fn run(&self, image: &ImageAsset) -> Result<FilterOutcome, UserError> {
        let key = StoredObjectRef::unique_key(image.filename());
        let lease = TemporaryObject::acquire(self.store.clone(), &key, image).await?;
        debug!(key = %lease.object().key(), "Image uploaded");

        let outcome = self.invoke(lease.object()).await;
        lease.release().await;
        outcome
    }

    async fn invoke(&self, object: &StoredObjectRef) -> Result<FilterOutcome, UserError> {
        let image_url = self.store.download_url(object).await?;

        self.phase.advance(ApplyPhase::Invoking);
        let response = self
            .api
            .apply_filter(&image_url)
            .await
            .map_err(|e| UserError::Network(e.to_string()))?;

        if !response.is_success() {
            return Err(UserError::Remote(response.into_message()));
        }
        let output_image = response
            .output_image()
            .ok_or_else(|| UserError::Remote("server returned no image".to_string()))?
            .to_string();

        Ok(FilterOutcome {
            output_image,
            message: response.into_message(),
        })
    }
}

/// Lease on an object parked in the store for one filter run.
///
/// Exists only after a successful upload. [`release`](Self::release)
/// deletes the object exactly once; a lease dropped unreleased (for example
/// when the `apply` future is cancelled) schedules the delete on the current
/// tokio runtime instead.
pub struct TemporaryObject {
    store: Arc<dyn ObjectStore>,
    object: StoredObjectRef,
    released: bool,
}

impl TemporaryObject {
    pub async fn acquire(
        store: Arc<dyn ObjectStore>,
        key: &str,
        asset: &ImageAsset,
    ) -> Result<Self, StorageError> {
        let object = store.put(key, asset).await?;
        Ok(Self {
            store,
            object,
            released: false,
        })
    }

    pub fn object(&self) -> &StoredObjectRef {
        &self.object
    }

    /// Delete the object. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        delete_logged(self.store.as_ref(), &self.object).await;
    }
}

impl Drop for TemporaryObject {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = self.store.clone();
        let object = self.object.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    delete_logged(store.as_ref(), &object).await;
                });
            }
            Err(_) => {
                warn!(key = %object.key(), "No runtime available; temporary object left behind");
            }
        }
    }
}

async fn delete_logged(store: &dyn ObjectStore, object: &StoredObjectRef) {
    match store.delete(object).await {
        Ok(()) => debug!(key = %object.key(), "Temporary object deleted"),
        Err(e) => warn!(key = %object.key(), error = %e, "Failed to delete temporary object"),
    }
}
