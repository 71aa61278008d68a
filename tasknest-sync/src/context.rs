/// Process-wide application context
///
/// Created once at startup and injected into every subscription, mutation and
/// screen. It owns the backend handles, the identity context, the image
/// source and the configuration; nothing in the crate reaches for globals.
///
/// # Example
///
/// ```
/// use tasknest_shared::backend::memory::MemoryBackend;
/// use tasknest_shared::config::Config;
/// use tasknest_sync::AppContext;
///
/// let config = Config::default_for_test();
/// let backend = MemoryBackend::new(&config.backend.storage_bucket);
/// let ctx = AppContext::from_memory(config, &backend);
/// assert!(ctx.identity().current_principal().is_none());
/// ```

use crate::identity::IdentityContext;
use crate::image::{ImageSource, LocalImageSource};
use std::sync::Arc;
use tasknest_shared::backend::memory::MemoryBackend;
use tasknest_shared::backend::{BlobStore, DocumentStore, IdentityProvider};
use tasknest_shared::config::Config;

/// Shared handles for one application session
#[derive(Clone)]
pub struct AppContext {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    identity: IdentityContext,
    images: Arc<dyn ImageSource>,
    config: Arc<Config>,
}

impl AppContext {
    /// Creates a context over the given backend collaborators
    pub fn new(
        config: Config,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let images = Arc::new(LocalImageSource::new(config.sync.image_fetch_timeout()));
        let identity = IdentityContext::new(identity, config.sync.require_verified_email);

        AppContext {
            documents,
            blobs,
            identity,
            images,
            config: Arc::new(config),
        }
    }

    /// Creates a context over an in-memory backend
    pub fn from_memory(config: Config, backend: &MemoryBackend) -> Self {
        Self::new(
            config,
            Arc::new(backend.documents.clone()),
            Arc::new(backend.blobs.clone()),
            Arc::new(backend.identity.clone()),
        )
    }

    /// Replaces the image source used to read local image URIs
    pub fn with_image_source(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.images = images;
        self
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn images(&self) -> &Arc<dyn ImageSource> {
        &self.images
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
