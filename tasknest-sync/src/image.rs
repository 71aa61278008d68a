/// Local image sources
///
/// Image attach flows receive a URI picked on the device and need its bytes
/// before anything is uploaded. [`LocalImageSource`] understands:
///
/// - `file:///path/to/image.jpg` and bare filesystem paths (read from disk)
/// - `http://` and `https://` URIs (fetched with a timeout)
///
/// Any other scheme is rejected with [`UploadError::UnsupportedUri`].

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasknest_shared::UploadError;

/// Reads the bytes behind a local image URI
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Reads the image at `uri`
    async fn read(&self, uri: &str) -> Result<Bytes, UploadError>;
}

/// Filesystem and HTTP image reader
pub struct LocalImageSource {
    http: reqwest::Client,
    timeout: Duration,
}

impl LocalImageSource {
    /// Creates a reader whose HTTP fetches time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        LocalImageSource {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    async fn read_file(&self, uri: &str, path: &str) -> Result<Bytes, UploadError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| UploadError::Read {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        Ok(Bytes::from(bytes))
    }

    async fn fetch(&self, uri: &str) -> Result<Bytes, UploadError> {
        let read_error = |e: reqwest::Error| UploadError::Read {
            uri: uri.to_string(),
            message: e.to_string(),
        };

        self.http
            .get(uri)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(read_error)?
            .bytes()
            .await
            .map_err(read_error)
    }
}

#[async_trait]
impl ImageSource for LocalImageSource {
    async fn read(&self, uri: &str) -> Result<Bytes, UploadError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.fetch(uri).await;
        }

        if let Some(path) = uri.strip_prefix("file://") {
            return self.read_file(uri, path).await;
        }

        if uri.contains("://") || uri.is_empty() {
            return Err(UploadError::UnsupportedUri(uri.to_string()));
        }

        self.read_file(uri, uri).await
    }
}

/// Image source serving fixed bytes per URI
///
/// Used by tests and the demo binary, where no device gallery exists.
#[derive(Clone, Default)]
pub struct InMemoryImageSource {
    images: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl InMemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the bytes returned for `uri`
    pub fn insert(&self, uri: impl Into<String>, bytes: impl Into<Bytes>) {
        self.images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(uri.into(), bytes.into());
    }
}

#[async_trait]
impl ImageSource for InMemoryImageSource {
    async fn read(&self, uri: &str) -> Result<Bytes, UploadError> {
        self.images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(uri)
            .cloned()
            .ok_or_else(|| UploadError::Read {
                uri: uri.to_string(),
                message: "no such image".to_string(),
            })
    }
}
