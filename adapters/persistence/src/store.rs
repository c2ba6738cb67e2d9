//! Key-value blob store port and its in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

/// Failures reported by a [`BlobStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("store request failed")]
    Request(#[from] reqwest::Error),
    /// The store answered with a non-success status.
    #[error("store returned status {status} for `{key}`")]
    Status {
        /// Key that was requested.
        key: String,
        /// HTTP status code returned by the store.
        status: u16,
    },
    /// No blob is stored under the key.
    #[error("no blob stored under `{key}`")]
    Missing {
        /// Key that was requested.
        key: String,
    },
    /// The blob does not have the expected shape.
    #[error("stored blob has an unexpected shape")]
    Decode(#[from] serde_json::Error),
}

/// Remote key-value store holding JSON blobs.
///
/// Writes replace the whole blob; there is no versioning, so concurrent
/// writers race and the last write wins.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetches the blob stored under `key`.
    async fn get(&self, key: &str) -> Result<Value, StoreError>;

    /// Replaces the blob stored under `key`.
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Process-local store used by tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryBlobStore {
    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            blobs: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value))
                    .collect(),
            ),
        }
    }

    /// Copy of the blob currently stored under `key`.
    pub async fn snapshot(&self, key: &str) -> Option<Value> {
        self.blobs.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Value, StoreError> {
        self.blobs
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::Missing {
                key: key.to_owned(),
            })
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _ = self.blobs.lock().await.insert(key.to_owned(), value);
        Ok(())
    }
}
