//! # TaskNest Sync Demo
//!
//! Runs the live sync core against the in-memory backend: signs a seeded
//! account in, follows the auth state with a navigator, creates a project,
//! column and task, attaches an image and prints what the screens see.
//!
//! ## Usage
//!
//! ```bash
//! TASKNEST_PROJECT_ID=tasknest-demo cargo run -p tasknest-sync
//! ```

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tasknest_shared::backend::memory::MemoryBackend;
use tasknest_shared::config::Config;
use tasknest_sync::image::InMemoryImageSource;
use tasknest_sync::{AccountScreen, AppContext, Navigator, NoticeLevel, NoticeSink, Route};
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_EMAIL: &str = "demo@tasknest.app";
const DEMO_PASSWORD: &str = "tasknest";
const DEMO_IMAGE_URI: &str = "file:///demo/cover.jpg";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasknest_sync=debug,tasknest_shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskNest Sync v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!(project_id = %config.backend.project_id, "Configuration loaded");

    let backend = MemoryBackend::new(&config.backend.storage_bucket);
    backend.identity.seed_account(DEMO_EMAIL, DEMO_PASSWORD, true);

    let images = InMemoryImageSource::new();
    images.insert(DEMO_IMAGE_URI, Bytes::from_static(b"\xff\xd8\xff\xe0demo"));

    let ctx = AppContext::from_memory(config, &backend).with_image_source(Arc::new(images));

    let (notices, mut notice_rx) = NoticeSink::channel();
    tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            match notice.level {
                NoticeLevel::Success => tracing::info!(title = %notice.title, "{}", notice.message),
                NoticeLevel::Error => tracing::warn!(title = %notice.title, "{}", notice.message),
            }
        }
    });

    let mut navigator = Navigator::new(&ctx, notices.clone());
    let mut auth_changes = ctx.identity().changes();

    // Initial state: nobody signed in
    if let Some(principal) = auth_changes.next().await {
        navigator.handle_auth_change(principal.as_ref()).await?;
    }

    let account = AccountScreen::new(&ctx, notices);
    account.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await?;

    if let Some(principal) = auth_changes.next().await {
        navigator.handle_auth_change(principal.as_ref()).await?;
    }

    let project_id = {
        let projects = navigator
            .top()
            .and_then(|screen| screen.as_projects())
            .ok_or_else(|| anyhow::anyhow!("project list is not open"))?;
        projects.set_draft_text("Launch");
        projects.submit().await?
    };

    navigator.push(Route::Board {
        project_id: project_id.clone(),
    })?;
    let column_id = {
        let board = navigator
            .top()
            .and_then(|screen| screen.as_board())
            .ok_or_else(|| anyhow::anyhow!("board is not open"))?;
        board.set_draft_text("To do");
        board.submit().await?
    };

    navigator.push(Route::Tasks {
        project_id,
        column_id,
    })?;
    {
        let tasks = navigator
            .top()
            .and_then(|screen| screen.as_tasks())
            .ok_or_else(|| anyhow::anyhow!("task list is not open"))?;
        tasks.set_draft_text("Write the announcement");
        let task_id = tasks.submit_with_image(Some(DEMO_IMAGE_URI)).await?;

        let mut revisions = tasks.watch();
        while tasks
            .record(&task_id)
            .and_then(|task| task.image_url)
            .is_none()
        {
            tokio::time::timeout(Duration::from_secs(1), revisions.changed()).await??;
        }

        for task in tasks.records() {
            tracing::info!(task_id = %task.id, name = %task.name, image_url = ?task.image_url, "Task");
        }
    }

    tracing::info!(routes = ?navigator.routes(), "Open screens");

    account.sign_out().await?;
    if let Some(principal) = auth_changes.next().await {
        navigator.handle_auth_change(principal.as_ref()).await?;
    }

    tracing::info!(depth = navigator.depth(), "Shutdown complete");

    Ok(())
}
