//! Copies local image bytes into the destination bucket.

use anyhow::{Context, Result};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;

/// Uploads local files to a single bucket.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Uploader {
    /// Create an uploader writing into `store`, which is rooted at `bucket`.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Upload `local_path` under `key`, returning the number of bytes written.
    ///
    /// An existing object with the same key is replaced.
    pub async fn upload(&self, local_path: &Path, key: &str) -> Result<u64> {
        let data = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Failed to read {}", local_path.display()))?;
        let size = data.len() as u64;

        tracing::info!(
            "Uploading {} to s3://{}/{} ({} bytes)",
            local_path.display(),
            self.bucket,
            key,
            size
        );

        let location = ObjectPath::from(key);
        self.store
            .put(&location, PutPayload::from(data))
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", self.bucket, key))?;

        Ok(size)
    }
}
