use std::collections::HashMap;

use bytes::Bytes;

use super::ObjectStore;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no such object: s3://{bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },
}

/// In-process object store used by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    map: tokio::sync::Mutex<HashMap<String, HashMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(
        &self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<Bytes>,
    ) {
        self.map
            .lock()
            .await
            .entry(bucket.into())
            .or_default()
            .insert(key.into(), body.into());
    }
}

impl ObjectStore for MemoryStore {
    type Error = Error;

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, Self::Error> {
        self.map
            .lock()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| Error::NoSuchKey {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            })
    }
}
