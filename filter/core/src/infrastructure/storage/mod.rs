// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Concrete implementations of the [`ObjectStore`] gateway.

pub mod firebase;

pub use firebase::FirebaseStorageAdapter;
pub use memory::MemoryObjectStore;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::config::{resolve_secret, StorageBackendKind, StorageConfig};
use crate::domain::storage::{ObjectStore, StorageError};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Firebase Cloud Storage bucket (production)
    Firebase {
        api_base: String,
        bucket: String,
        auth_token: Option<String>,
        timeout: Duration,
    },

    /// In-process store for development and tests
    Memory,
}

impl StorageBackend {
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        match config.backend {
            StorageBackendKind::Firebase => {
                let bucket = config
                    .bucket
                    .clone()
                    .filter(|bucket| !bucket.trim().is_empty())
                    .ok_or_else(|| anyhow::anyhow!("storage.bucket is required for firebase"))?;
                Ok(StorageBackend::Firebase {
                    api_base: config.api_base.clone(),
                    bucket,
                    auth_token: resolve_secret(&config.auth_token)?,
                    timeout: Duration::from_secs(config.timeout_secs),
                })
            }
            StorageBackendKind::Memory => Ok(StorageBackend::Memory),
        }
    }
}

/// Factory function to create an object store from configuration
pub fn create_object_store(backend: StorageBackend) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match backend {
        StorageBackend::Firebase {
            api_base,
            bucket,
            auth_token,
            timeout,
        } => {
            let mut adapter = FirebaseStorageAdapter::with_timeout(api_base, bucket, timeout)?;
            if let Some(token) = auth_token {
                adapter = adapter.with_auth_token(token);
            }
            Ok(Arc::new(adapter))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryObjectStore::new())),
    }
}

mod memory {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::domain::storage::{validate_key, ImageAsset, ObjectStore, StorageError, StoredObjectRef};

    /// In-memory object store.
    ///
    /// Counts deletions per key and can be told to fail any operation.
    pub struct MemoryObjectStore {
        public_base: String,
        objects: Mutex<HashMap<String, ImageAsset>>,
        deletions: Mutex<HashMap<String, usize>>,
        fail_put: AtomicBool,
        fail_url: AtomicBool,
        fail_delete: AtomicBool,
    }

    impl Default for MemoryObjectStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MemoryObjectStore {
        pub fn new() -> Self {
            Self::with_public_base("memory://objects")
        }

        pub fn with_public_base(public_base: impl Into<String>) -> Self {
            Self {
                public_base: public_base.into().trim_end_matches('/').to_string(),
                objects: Mutex::new(HashMap::new()),
                deletions: Mutex::new(HashMap::new()),
                fail_put: AtomicBool::new(false),
                fail_url: AtomicBool::new(false),
                fail_delete: AtomicBool::new(false),
            }
        }

        pub fn fail_put(&self, fail: bool) {
            self.fail_put.store(fail, Ordering::SeqCst);
        }

        pub fn fail_download_url(&self, fail: bool) {
            self.fail_url.store(fail, Ordering::SeqCst);
        }

        pub fn fail_delete(&self, fail: bool) {
            self.fail_delete.store(fail, Ordering::SeqCst);
        }

        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().contains_key(key)
        }

        pub fn get(&self, key: &str) -> Option<ImageAsset> {
            self.objects.lock().get(key).cloned()
        }

        pub fn keys(&self) -> Vec<String> {
            self.objects.lock().keys().cloned().collect()
        }

        pub fn len(&self) -> usize {
            self.objects.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.objects.lock().is_empty()
        }

        /// Number of delete calls issued for `key`, successful or not.
        pub fn deletions(&self, key: &str) -> usize {
            self.deletions.lock().get(key).copied().unwrap_or(0)
        }

        pub fn total_deletions(&self) -> usize {
            self.deletions.lock().values().sum()
        }

        pub fn url_for(&self, key: &str) -> String {
            format!("{}/{}", self.public_base, key)
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryObjectStore {
        async fn put(&self, key: &str, asset: &ImageAsset) -> Result<StoredObjectRef, StorageError> {
            validate_key(key)?;
            if self.fail_put.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("put disabled".to_string()));
            }
            self.objects.lock().insert(key.to_string(), asset.clone());
            Ok(StoredObjectRef::new(key, asset.filename()))
        }

        async fn download_url(&self, object: &StoredObjectRef) -> Result<String, StorageError> {
            if self.fail_url.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("download URL disabled".to_string()));
            }
            if !self.contains(object.key()) {
                return Err(StorageError::NotFound(object.key().to_string()));
            }
            Ok(self.url_for(object.key()))
        }

        async fn delete(&self, object: &StoredObjectRef) -> Result<(), StorageError> {
            *self
                .deletions
                .lock()
                .entry(object.key().to_string())
                .or_insert(0) += 1;
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("delete disabled".to_string()));
            }
            self.objects
                .lock()
                .remove(object.key())
                .map(|_| ())
                .ok_or_else(|| StorageError::NotFound(object.key().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::ImageAsset;

    #[test]
    fn test_factory_firebase() {
        let store = create_object_store(StorageBackend::Firebase {
            api_base: "http://localhost:9199/v0".to_string(),
            bucket: "demo.appspot.com".to_string(),
            auth_token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }

    #[test]
    fn test_backend_from_config() {
        let config = StorageConfig::default();
        assert!(StorageBackend::from_config(&config).is_err(), "bucket required");

        let config = StorageConfig {
            bucket: Some("demo.appspot.com".to_string()),
            ..StorageConfig::default()
        };
        assert!(matches!(
            StorageBackend::from_config(&config).unwrap(),
            StorageBackend::Firebase { .. }
        ));

        let config = StorageConfig {
            backend: StorageBackendKind::Memory,
            ..StorageConfig::default()
        };
        assert!(matches!(
            StorageBackend::from_config(&config).unwrap(),
            StorageBackend::Memory
        ));
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryObjectStore::new();
        let asset = ImageAsset::new(vec![1, 2, 3], "cat.png", "image/png");

        let object = store.put("k-cat.png", &asset).await.unwrap();
        assert_eq!(object.filename(), "cat.png");
        assert_eq!(store.get("k-cat.png"), Some(asset));
        assert_eq!(
            store.download_url(&object).await.unwrap(),
            "memory://objects/k-cat.png"
        );

        store.delete(&object).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.deletions("k-cat.png"), 1);
        assert!(matches!(
            store.delete(&object).await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(store.deletions("k-cat.png"), 2);
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryObjectStore::new();
        let asset = ImageAsset::new(vec![1], "cat.png", "image/png");

        store.fail_put(true);
        assert!(store.put("k", &asset).await.is_err());
        assert!(store.is_empty());
        store.fail_put(false);

        let object = store.put("k", &asset).await.unwrap();
        store.fail_download_url(true);
        assert!(store.download_url(&object).await.is_err());

        store.fail_delete(true);
        assert!(store.delete(&object).await.is_err());
        assert!(store.contains("k"));
    }
}
