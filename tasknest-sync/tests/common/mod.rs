#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - In-memory backend and application context
/// - Seeded, signed-in principals
/// - Notice collection
/// - Polling helpers for asynchronous pushes

use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tasknest_shared::backend::memory::MemoryBackend;
use tasknest_shared::backend::{DocumentStore, Fields};
use tasknest_shared::config::Config;
use tasknest_shared::models::Principal;
use tasknest_shared::paths::CollectionPath;
use tasknest_sync::image::InMemoryImageSource;
use tasknest_sync::notice::Notice;
use tasknest_sync::{AppContext, NoticeSink};
use tokio::sync::mpsc;

pub const PASSWORD: &str = "secret1";
pub const IMAGE_URI: &str = "file:///photos/cover.jpg";

/// Test context containing all necessary resources
pub struct TestContext {
    pub backend: MemoryBackend,
    pub ctx: AppContext,
    pub images: InMemoryImageSource,
    pub notices: NoticeSink,
    pub notice_rx: mpsc::UnboundedReceiver<Notice>,
}

impl TestContext {
    /// Creates a context over a fresh in-memory backend
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::default_for_test();
        let backend = MemoryBackend::new(&config.backend.storage_bucket);

        let images = InMemoryImageSource::new();
        images.insert(IMAGE_URI, &b"\xff\xd8\xff\xe0cover"[..]);

        let ctx = AppContext::from_memory(config, &backend)
            .with_image_source(Arc::new(images.clone()));
        let (notices, notice_rx) = NoticeSink::channel();

        Ok(TestContext {
            backend,
            ctx,
            images,
            notices,
            notice_rx,
        })
    }

    /// Seeds a verified account without signing it in
    pub fn seed(&self, email: &str) -> Principal {
        self.backend.identity.seed_account(email, PASSWORD, true)
    }

    /// Seeds a verified account and makes it the current principal
    pub fn sign_in(&self, email: &str) -> Principal {
        let principal = self.seed(email);
        self.backend.identity.sign_in_as(principal.clone());
        principal
    }

    /// Writes a named document straight into the store, owned by `owner_id`
    pub async fn insert(
        &self,
        path: &CollectionPath,
        name: &str,
        owner_id: &str,
    ) -> anyhow::Result<String> {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), JsonValue::from(name));
        fields.insert("userId".to_string(), JsonValue::from(owner_id));

        Ok(self.backend.documents.create(path, fields).await?)
    }

    /// Notices emitted so far
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notice_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

/// Helper to wait for condition with timeout
pub async fn wait_for<F>(condition: F, timeout_secs: u64) -> anyhow::Result<()>
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_secs(timeout_secs);

    loop {
        if condition() {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Condition not met within {} seconds", timeout_secs);
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Lets spawned delivery tasks run without waiting for a condition
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
