//! HTTP-backed blob store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::store::{BlobStore, StoreError};

/// Blob store reached over HTTP, one URL per key under a base URL.
///
/// Responses wrapped in a `{"record": ...}` envelope are unwrapped.
#[derive(Clone, Debug)]
pub struct HttpBlobStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBlobStore {
    /// Creates a client for the store rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

fn check_status(key: &str, status: StatusCode) -> Result<(), StoreError> {
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::Missing {
            key: key.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(StoreError::Status {
            key: key.to_owned(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

fn unwrap_record(body: Value) -> Value {
    match body {
        Value::Object(mut fields) => match fields.remove("record") {
            Some(record) => record,
            None => Value::Object(fields),
        },
        other => other,
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get(&self, key: &str) -> Result<Value, StoreError> {
        let response = self.http.get(self.url(key)).send().await?;
        check_status(key, response.status())?;
        let body = response.json::<Value>().await?;
        Ok(unwrap_record(body))
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let response = self.http.put(self.url(key)).json(&value).send().await?;
        check_status(key, response.status())
    }
}
