/// In-memory blob store
///
/// Blob URLs have the form `memory://{bucket}/{path}`.

use super::{lock, FaultInjector, FaultPoint};
use crate::backend::{BackendError, BackendResult, BlobHandle, BlobStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const URL_SCHEME: &str = "memory://";

/// Blob store kept entirely in memory
#[derive(Clone)]
pub struct MemoryBlobStore {
    bucket: String,
    blobs: Arc<Mutex<HashMap<String, Bytes>>>,
    faults: FaultInjector,
}

impl MemoryBlobStore {
    /// Creates an empty store for `bucket`
    pub fn new(bucket: &str) -> Self {
        Self::with_faults(bucket, FaultInjector::new())
    }

    /// Creates an empty store sharing a fault injector
    pub fn with_faults(bucket: &str, faults: FaultInjector) -> Self {
        MemoryBlobStore {
            bucket: bucket.to_string(),
            blobs: Arc::default(),
            faults,
        }
    }

    /// URL under which a stored path is served
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}/{}", URL_SCHEME, self.bucket, path)
    }

    /// Whether a blob exists at `path`
    pub fn contains(&self, path: &str) -> bool {
        lock(&self.blobs).contains_key(path)
    }

    /// Bytes stored at `path`
    pub fn get(&self, path: &str) -> Option<Bytes> {
        lock(&self.blobs).get(path).cloned()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        lock(&self.blobs).len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = lock(&self.blobs).keys().cloned().collect();
        paths.sort();
        paths
    }

    fn path_from_url<'a>(&self, url: &'a str) -> BackendResult<&'a str> {
        url.strip_prefix(URL_SCHEME)
            .and_then(|rest| rest.strip_prefix(self.bucket.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|path| !path.is_empty())
            .ok_or_else(|| BackendError::InvalidBlobUrl(url.to_string()))
    }

    fn fault(&self, point: FaultPoint) -> BackendResult<()> {
        if self.faults.should_fail(point) {
            return Err(BackendError::Unavailable(format!(
                "injected {:?} failure",
                point
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> BackendResult<BlobHandle> {
        self.fault(FaultPoint::Upload)?;

        lock(&self.blobs).insert(path.to_string(), bytes);
        Ok(BlobHandle {
            path: path.to_string(),
        })
    }

    async fn get_url(&self, handle: &BlobHandle) -> BackendResult<String> {
        self.fault(FaultPoint::GetUrl)?;

        if !self.contains(&handle.path) {
            return Err(BackendError::BlobNotFound(handle.path.clone()));
        }
        Ok(self.url_for(&handle.path))
    }

    async fn delete_blob(&self, url: &str) -> BackendResult<()> {
        self.fault(FaultPoint::DeleteBlob)?;

        let path = self.path_from_url(url)?;
        match lock(&self.blobs).remove(path) {
            Some(_) => Ok(()),
            None => Err(BackendError::BlobNotFound(path.to_string())),
        }
    }
}
